//! 规约（Specification）
//!
//! 把业务规则封装为可组合的谓词。字段授权规则即表达为
//! `Specification<RoleSet>`，见 `authorization` 模块。
//!

/// 规约模式的核心 trait
pub trait Specification<T: ?Sized> {
    /// 检查候选对象是否满足规约
    fn is_satisfied_by(&self, candidate: &T) -> bool;

    fn and<S>(self, other: S) -> And<Self, S>
    where
        Self: Sized,
        S: Specification<T>,
    {
        And(self, other)
    }

    fn or<S>(self, other: S) -> Or<Self, S>
    where
        Self: Sized,
        S: Specification<T>,
    {
        Or(self, other)
    }

    fn not(self) -> Not<Self>
    where
        Self: Sized,
    {
        Not(self)
    }
}

impl<T: ?Sized, S: Specification<T> + ?Sized> Specification<T> for &S {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        (**self).is_satisfied_by(candidate)
    }
}

impl<T: ?Sized> Specification<T> for Box<dyn Specification<T> + Send + Sync> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.as_ref().is_satisfied_by(candidate)
    }
}

/// 两个规约都满足
#[derive(Debug, Clone, Copy)]
pub struct And<A, B>(pub A, pub B);

impl<T: ?Sized, A: Specification<T>, B: Specification<T>> Specification<T> for And<A, B> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.0.is_satisfied_by(candidate) && self.1.is_satisfied_by(candidate)
    }
}

/// 任一规约满足
#[derive(Debug, Clone, Copy)]
pub struct Or<A, B>(pub A, pub B);

impl<T: ?Sized, A: Specification<T>, B: Specification<T>> Specification<T> for Or<A, B> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.0.is_satisfied_by(candidate) || self.1.is_satisfied_by(candidate)
    }
}

/// 内部规约不满足
#[derive(Debug, Clone, Copy)]
pub struct Not<A>(pub A);

impl<T: ?Sized, A: Specification<T>> Specification<T> for Not<A> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        !self.0.is_satisfied_by(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Even;
    impl Specification<i32> for Even {
        fn is_satisfied_by(&self, n: &i32) -> bool {
            n % 2 == 0
        }
    }

    struct Positive;
    impl Specification<i32> for Positive {
        fn is_satisfied_by(&self, n: &i32) -> bool {
            *n > 0
        }
    }

    #[test]
    fn combinators() {
        assert!(Even.and(Positive).is_satisfied_by(&4));
        assert!(!Even.and(Positive).is_satisfied_by(&-4));
        assert!(Even.or(Positive).is_satisfied_by(&-4));
        assert!(!Even.or(Positive).is_satisfied_by(&-3));
        assert!(Even.not().is_satisfied_by(&3));
    }

    #[test]
    fn boxed_and_borrowed_specs_compose() {
        let boxed: Box<dyn Specification<i32> + Send + Sync> = Box::new(Even.not());
        assert!((&boxed).and(Positive).is_satisfied_by(&3));
        assert!(!boxed.is_satisfied_by(&2));
    }
}
