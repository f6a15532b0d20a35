//! Reservation availability and lifecycle engine
//!
//! # Module layout
//!
//! ```text
//! booking-engine/src/
//! ├── time.rs          # timezone conversion, 12/24-hour formatting
//! ├── capacity.rs      # table allocation with slack threshold
//! ├── slots.rs         # slot generation, capacity guard
//! ├── schedule.rs      # applicable setting, booking/cancellation windows
//! ├── confirmation.rs  # confirmation codes with bounded retry
//! ├── link.rs          # HMAC management links
//! ├── payment.rs       # deposit holds over a gateway seam
//! ├── notify.rs        # notification rendering + Notifier seam
//! ├── repository.rs    # ReservationStore seam
//! ├── memory.rs        # in-memory ReservationStore
//! ├── lifecycle.rs     # create / modify / cancel
//! ├── reminders.rs     # reminder sweep
//! └── testing.rs       # recording gateway and notifier
//! ```

pub mod capacity;
pub mod clock;
pub mod config;
pub mod confirmation;
pub mod error;
pub mod lifecycle;
pub mod link;
pub mod memory;
pub mod notify;
pub mod payment;
pub mod reminders;
pub mod repository;
pub mod schedule;
pub mod slots;
pub mod testing;
pub mod time;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use error::BookingError;
pub use lifecycle::{
    Availability, BookingReceipt, CancellationReceipt, DepositOutcome, ReservationService,
};
pub use link::LinkSigner;
pub use memory::MemoryStore;
pub use notify::{NotificationKind, NotificationParams, Notifier, NotifyError};
pub use payment::{DepositGateway, DepositHold, GatewayError, IntentStatus, is_valid_intent_id};
pub use reminders::{ReminderKind, SweepReport};
pub use repository::{ListScope, RepoError, RepoResult, ReservationStore};
pub use slots::CapacityGuard;
