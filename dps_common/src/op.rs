//! Forwarding macros for implementing arithmetic operators on integer newtypes.

/// Implement a std::ops trait for a tuple newtype by forwarding to the inner value.
///
/// * `binary` covers `Add`-style traits (`Self x Self -> Self`),
/// * `inplace` covers `AddAssign`-style traits,
/// * `unary` covers `Neg`-style traits.
#[macro_export]
macro_rules! op {
    (binary $ty:ty, $op:ident, $method:ident) => {
        impl std::ops::$op for $ty {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self::Output {
                Self(std::ops::$op::$method(self.0, rhs.0))
            }
        }
    };
    (inplace $ty:ty, $op:ident, $method:ident) => {
        impl std::ops::$op for $ty {
            fn $method(&mut self, rhs: Self) {
                std::ops::$op::$method(&mut self.0, rhs.0);
            }
        }
    };
    (unary $ty:ty, $op:ident, $method:ident) => {
        impl std::ops::$op for $ty {
            type Output = Self;

            fn $method(self) -> Self::Output {
                Self(std::ops::$op::$method(self.0))
            }
        }
    };
}
