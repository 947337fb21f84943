//! Order transaction core for the commerce system.
//!
//! The [`OrderCoordinator`] orchestrates the three stock-affecting
//! operations as single atomic transactions over a [`store::Store`]:
//!
//! 1. **Checkout**: converts a non-empty cart into a pending order,
//!    re-reading live stock for every line, decrementing it, and
//!    appending one audit row per product. Any failure aborts every
//!    write; nothing is partially applied.
//! 2. **Cancellation**: the symmetric reversal for pending orders.
//!    Restores every reserved quantity, appends the matching audit rows,
//!    and moves the order to `cancelled`.
//! 3. **Status update**: an operator force-set with no stock effects,
//!    checked against the status lifecycle table.
//!
//! Confirmation emails are dispatched strictly after commit and are
//! best-effort: a failing notifier is logged and counted, never allowed
//! to affect the transaction outcome.

pub mod cart;
pub mod coordinator;
pub mod error;
pub mod mail;
pub mod notifier;

pub use cart::CartService;
pub use coordinator::{
    CheckoutRequest, OrderCoordinator, STOCK_REMOVED_NOTE, STOCK_RESTORED_NOTE,
};
pub use error::{CheckoutError, Result};
pub use notifier::{InMemoryNotifier, Mail, Notifier, NotifierError};
