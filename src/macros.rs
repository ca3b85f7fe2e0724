/// Builds a `Sequence` rule from a list of rule expressions.
///
/// `seq![a, b, c]` is sugar for `seq(vec![a, b, c])`.
#[macro_export]
macro_rules! seq {
    ($($r:expr),* $(,)?) => {
        $crate::seq(vec![$($r),*])
    };
}

/// Builds a `Choice` rule from a list of rule expressions.
///
/// `alt![a, b, c]` is sugar for `alt(vec![a, b, c])`.
#[macro_export]
macro_rules! alt {
    ($($r:expr),* $(,)?) => {
        $crate::alt(vec![$($r),*])
    };
}
