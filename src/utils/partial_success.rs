//! Best-effort operations report what they could not do next to what they did.
//!
//! A [`PartialSuccess`] carries the usable result together with every error that
//! was tolerated on the way. The caller decides whether to log, surface or
//! ignore them.

use itertools::Itertools ;



/// The result of an operation where some parts failed without preventing overall success.
/// The `Vec<E>` contains errors from the failed parts that were handled gracefully.
pub type PartialSuccess<T, E> = ( T, Vec<E> );

/// Splits a stream of fallible parts into a [`PartialSuccess`].
pub(crate) trait CollectPartial<T, E>: Iterator<Item = Result<T, E>> + Sized {
    /// Successful parts are collected in order; failures are kept aside.
    fn collect_partial<C: Default + Extend<T>>( self ) -> PartialSuccess<C, E> {
        self.partition_result()
    }
}

impl<T, E, I: Iterator<Item = Result<T, E>>> CollectPartial<T, E> for I {}

#[cfg( test )]
mod tests {

    use super::*;

    #[test]
    fn keeps_order_of_both_sides() {
        let ( values, errors ): PartialSuccess<Vec<u8>, &str> = vec![ Ok( 1 ), Err( "a" ), Ok( 2 ), Err( "b" )]
            .into_iter()
            .collect_partial();
        assert_eq!( values, vec![ 1, 2 ]);
        assert_eq!( errors, vec![ "a", "b" ]);
    }

}
