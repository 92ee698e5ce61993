pub type Result<T> = std::result::Result<T, crate::error::Error>;

#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

#[inline]
pub fn verify_arg(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_arg(name, condition)
    }
}

#[cold]
pub fn invalid_arg(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidArgument {
        name: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;

    fn check(count: usize) -> super::Result<usize> {
        verify_arg!(count, count >= 1);
        Ok(count)
    }

    #[test]
    fn test_verify_arg() {
        assert_eq!(check(3).unwrap(), 3);
        let e = check(0).unwrap_err();
        match e.kind() {
            ErrorKind::InvalidArgument { name, message } => {
                assert_eq!(name, "count");
                assert_eq!(message, "count >= 1");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
