pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// Returns an invalid-argument error from the enclosing function unless
/// `$cond` holds. The error names the argument and the failed condition.
#[macro_export]
macro_rules! verify_arg {
    ($name:ident, $cond:expr) => {
        if !($cond) {
            return Err($crate::error::Error::invalid_arg(
                stringify!($name),
                concat!("expected ", stringify!($cond)),
            ));
        }
    };
}

/// Returns a corrupt-data error from the enclosing function unless `$cond`
/// holds. Used for checks on persisted bytes.
#[macro_export]
macro_rules! verify_data {
    ($element:ident, $cond:expr) => {
        if !($cond) {
            return Err($crate::error::Error::corrupt_data(
                stringify!($element),
                concat!("expected ", stringify!($cond)),
            ));
        }
    };
}
