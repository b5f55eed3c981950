pub mod hotel;
pub mod reservation;
pub mod session;

pub use hotel::Hotel;
pub use reservation::{Reservation, ReservationStatus};
pub use session::{ConversationSession, SessionKey, Step, SESSION_TTL_MINUTES};
