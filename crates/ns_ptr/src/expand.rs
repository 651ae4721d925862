//! Guarded expansion at the call site.
//!
//! Both macros expand to a `let ... else` in the caller's own body, so the
//! `return` or `continue` in the empty arm leaves the *caller's* function or
//! loop.
//!
//! By default the source is expanded with [`Nullable::expand`], leaving it
//! untouched. A leading `take` uses [`Nullable::take_not_null`] instead, which
//! moves the handle out and is the only form that accepts `Box<T>`.
//!
//! [`Nullable::expand`]: crate::Nullable::expand
//! [`Nullable::take_not_null`]: crate::Nullable::take_not_null

/// Expands a [`Nullable`] into a [`NotNull`] binding, or returns from the
/// enclosing function.
///
/// | Form | When empty |
/// |------|------------|
/// | `expand_or_return!(src => name)` | `return;` |
/// | `expand_or_return!(src => name, value)` | `return value;` |
/// | `expand_or_return!(src => name, value, { cleanup })` | runs `cleanup`, then `return value;` |
///
/// Any form may start with `take` to move the handle out of `src`. The
/// binding is a pattern, so `mut name` works too.
///
/// Without `take`, `src` is left as it was. A `Box<T>` source only accepts the
/// `take` forms, which leave it empty.
///
/// # Examples
///
/// ```
/// use ns_ptr::{Nullable, expand_or_return};
/// use std::rc::Rc;
///
/// fn area(side: &Nullable<Rc<u32>>, log: &mut Vec<&'static str>) -> u32 {
///     expand_or_return!(side => side, 0, { log.push("no side") });
///     *side * *side
/// }
///
/// let mut log = Vec::new();
/// assert_eq!(area(&Nullable::make_from(3), &mut log), 9);
/// assert_eq!(area(&Nullable::empty(), &mut log), 0);
/// assert_eq!(log, ["no side"]);
/// ```
///
/// Moving out of a `Box`:
///
/// ```
/// use ns_ptr::{NotNull, Nullable, expand_or_return};
///
/// fn consume(mut slot: Nullable<Box<String>>) -> usize {
///     expand_or_return!(take slot => text, 0);
///     NotNull::into_inner(text).len()
/// }
///
/// assert_eq!(consume(Nullable::make_from("four".into())), 4);
/// assert_eq!(consume(Nullable::empty()), 0);
/// ```
///
/// [`Nullable`]: crate::Nullable
/// [`NotNull`]: crate::NotNull
#[macro_export]
macro_rules! expand_or_return {
    (@expand $method:ident, $nullable:expr => $binding:pat, [$($ret:expr)?], $on_absent:block) => {
        let ::core::option::Option::Some($binding) = ($nullable).$method() else {
            $on_absent
            return $($ret)?;
        };
    };
    (take $nullable:expr => $binding:pat $(,)?) => {
        $crate::expand_or_return!(@expand take_not_null, $nullable => $binding, [], {})
    };
    (take $nullable:expr => $binding:pat, $ret:expr $(,)?) => {
        $crate::expand_or_return!(@expand take_not_null, $nullable => $binding, [$ret], {})
    };
    (take $nullable:expr => $binding:pat, $ret:expr, $on_absent:block $(,)?) => {
        $crate::expand_or_return!(@expand take_not_null, $nullable => $binding, [$ret], $on_absent)
    };
    ($nullable:expr => $binding:pat $(,)?) => {
        $crate::expand_or_return!(@expand expand, $nullable => $binding, [], {})
    };
    ($nullable:expr => $binding:pat, $ret:expr $(,)?) => {
        $crate::expand_or_return!(@expand expand, $nullable => $binding, [$ret], {})
    };
    ($nullable:expr => $binding:pat, $ret:expr, $on_absent:block $(,)?) => {
        $crate::expand_or_return!(@expand expand, $nullable => $binding, [$ret], $on_absent)
    };
}

/// Expands a [`Nullable`] into a [`NotNull`] binding, or continues the
/// enclosing loop.
///
/// | Form | When empty |
/// |------|------------|
/// | `expand_or_continue!(src => name)` | `continue;` |
/// | `expand_or_continue!(src => name, 'label)` | `continue 'label;` |
/// | `expand_or_continue!(src => name, { cleanup })` | runs `cleanup`, then `continue;` |
/// | `expand_or_continue!(src => name, { cleanup }, 'label)` | runs `cleanup`, then `continue 'label;` |
///
/// Any form may start with `take` to move the handle out of `src`.
///
/// # Examples
///
/// ```
/// use ns_ptr::{Nullable, expand_or_continue};
/// use std::rc::Rc;
///
/// let slots = [
///     Nullable::<Rc<i32>>::make_from(1),
///     Nullable::empty(),
///     Nullable::make_from(3),
/// ];
///
/// let mut sum = 0;
/// let mut skipped = 0;
/// for slot in &slots {
///     expand_or_continue!(slot => value, { skipped += 1 });
///     sum += *value;
/// }
///
/// assert_eq!((sum, skipped), (4, 1));
/// ```
///
/// [`Nullable`]: crate::Nullable
/// [`NotNull`]: crate::NotNull
#[macro_export]
macro_rules! expand_or_continue {
    (@expand $method:ident, $nullable:expr => $binding:pat, $on_absent:block, [$($label:lifetime)?]) => {
        let ::core::option::Option::Some($binding) = ($nullable).$method() else {
            $on_absent
            continue $($label)?;
        };
    };
    (take $nullable:expr => $binding:pat $(,)?) => {
        $crate::expand_or_continue!(@expand take_not_null, $nullable => $binding, {}, [])
    };
    (take $nullable:expr => $binding:pat, $label:lifetime $(,)?) => {
        $crate::expand_or_continue!(@expand take_not_null, $nullable => $binding, {}, [$label])
    };
    (take $nullable:expr => $binding:pat, $on_absent:block $(,)?) => {
        $crate::expand_or_continue!(@expand take_not_null, $nullable => $binding, $on_absent, [])
    };
    (take $nullable:expr => $binding:pat, $on_absent:block, $label:lifetime $(,)?) => {
        $crate::expand_or_continue!(@expand take_not_null, $nullable => $binding, $on_absent, [$label])
    };
    ($nullable:expr => $binding:pat $(,)?) => {
        $crate::expand_or_continue!(@expand expand, $nullable => $binding, {}, [])
    };
    ($nullable:expr => $binding:pat, $label:lifetime $(,)?) => {
        $crate::expand_or_continue!(@expand expand, $nullable => $binding, {}, [$label])
    };
    ($nullable:expr => $binding:pat, $on_absent:block $(,)?) => {
        $crate::expand_or_continue!(@expand expand, $nullable => $binding, $on_absent, [])
    };
    ($nullable:expr => $binding:pat, $on_absent:block, $label:lifetime $(,)?) => {
        $crate::expand_or_continue!(@expand expand, $nullable => $binding, $on_absent, [$label])
    };
}

#[cfg(test)]
mod tests {
    use crate::{NotNull, Nullable};
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::Cell;

    fn read(src: &Nullable<Rc<i32>>) -> i32 {
        expand_or_return!(src => value, -1);
        *value
    }

    fn read_unit(src: &Nullable<Rc<i32>>, seen: &Cell<i32>) {
        expand_or_return!(src => value);
        seen.set(*value);
    }

    fn read_with_cleanup(src: &Nullable<Rc<i32>>, cleanups: &Cell<u32>) -> Option<i32> {
        expand_or_return!(src => value, None, { cleanups.set(cleanups.get() + 1) });
        Some(*value)
    }

    #[test]
    fn return_variants() {
        let full = Nullable::<Rc<i32>>::make_from(5);
        let empty = Nullable::<Rc<i32>>::empty();

        assert_eq!(read(&full), 5);
        assert_eq!(read(&empty), -1);

        let seen = Cell::new(0);
        read_unit(&empty, &seen);
        assert_eq!(seen.get(), 0);
        read_unit(&full, &seen);
        assert_eq!(seen.get(), 5);

        let cleanups = Cell::new(0);
        assert_eq!(read_with_cleanup(&full, &cleanups), Some(5));
        assert_eq!(cleanups.get(), 0);
        assert_eq!(read_with_cleanup(&empty, &cleanups), None);
        assert_eq!(cleanups.get(), 1);
    }

    #[test]
    fn expansion_leaves_source() {
        fn bump(src: &Nullable<Rc<Cell<i32>>>) -> usize {
            expand_or_return!(src => cell, 0);
            cell.set(cell.get() + 1);
            NotNull::use_count(&cell)
        }

        let src = Nullable::<Rc<Cell<i32>>>::make_from(Cell::new(0));
        assert_eq!(bump(&src), 2);
        assert_eq!(bump(&src), 2);
        assert!(src.is_present());

        let value = src.expand().unwrap();
        assert_eq!(value.get(), 2);
    }

    #[test]
    fn take_variants() {
        fn unbox(mut src: Nullable<Box<i32>>, cleanups: &Cell<u32>) -> i32 {
            expand_or_return!(take src => mut value, 0, { cleanups.set(cleanups.get() + 1) });
            *value += 1;
            NotNull::into_inner(value)
        }

        let cleanups = Cell::new(0);
        assert_eq!(unbox(Nullable::make_from(1), &cleanups), 2);
        assert_eq!(unbox(Nullable::empty(), &cleanups), 0);
        assert_eq!(cleanups.get(), 1);

        let mut slots = [
            Nullable::<Box<i32>>::make_from(1),
            Nullable::empty(),
            Nullable::make_from(2),
        ];
        let mut taken = Vec::new();
        for slot in &mut slots {
            expand_or_continue!(take slot => value);
            taken.push(NotNull::into_inner(value));
        }
        assert_eq!(taken, [1, 2]);
        assert!(slots.iter().all(Nullable::is_empty));
    }

    #[test]
    fn continue_variants() {
        let slots = [
            Nullable::<Rc<i32>>::empty(),
            Nullable::make_from(10),
            Nullable::empty(),
            Nullable::make_from(20),
        ];

        let mut plain = 0;
        for slot in &slots {
            expand_or_continue!(slot => value);
            plain += *value;
        }
        assert_eq!(plain, 30);

        let mut skipped = 0;
        let mut cleaned = 0;
        for slot in &slots {
            expand_or_continue!(slot => value, { skipped += 1 });
            cleaned += *value;
        }
        assert_eq!((cleaned, skipped), (30, 2));
    }

    #[test]
    fn labeled_continue() {
        let rows = [
            [Nullable::<Rc<i32>>::make_from(1), Nullable::make_from(2)],
            [Nullable::empty(), Nullable::make_from(100)],
            [Nullable::make_from(3), Nullable::empty()],
        ];

        let mut rows_done = 0;
        let mut sum = 0;
        'rows: for row in &rows {
            for cell in row {
                expand_or_continue!(cell => value, 'rows);
                sum += *value;
            }
            rows_done += 1;
        }
        assert_eq!((sum, rows_done), (6, 1));

        let mut gaps = 0;
        sum = 0;
        'rows: for row in &rows {
            for cell in row {
                expand_or_continue!(cell => value, { gaps += 1 }, 'rows);
                sum += *value;
            }
        }
        assert_eq!((sum, gaps), (6, 2));
    }

    #[test]
    fn borrowed_expansion() {
        fn read_raw(src: &Nullable<*mut u64>) -> u64 {
            expand_or_return!(src => value, 0);
            *value
        }

        let mut src = Nullable::<*mut u64>::make_from(64);
        assert_eq!(read_raw(&src), 64);

        // SAFETY: the expanded alias inside `read_raw` is gone.
        unsafe { src.release() };
        assert_eq!(read_raw(&src), 0);
    }

    #[test]
    fn round_trip_through_nullable() {
        fn through(value: NotNull<Rc<i32>>) -> i32 {
            let nullable = Nullable::from(value);
            expand_or_return!(nullable => value, i32::MIN);
            *value
        }

        assert_eq!(through(NotNull::make_from(77)), 77);
    }
}
