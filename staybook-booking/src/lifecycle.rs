//! The booking state machine.
//!
//! Every status change goes through [`Transition::apply`]; nothing else in
//! the crate compares statuses to decide whether a move is legal.

use std::fmt;

use staybook_core::{BookingError, BookingResult};
use staybook_shared::{BookingStatus, RoomStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Confirm,
    CheckIn,
    CheckOut,
    Cancel,
    MarkNoShow,
}

impl Transition {
    /// Target status, or why the move is rejected from `from`.
    pub fn apply(self, from: BookingStatus) -> BookingResult<BookingStatus> {
        use BookingStatus::*;

        match (self, from) {
            (Transition::Confirm, PendingPayment) => Ok(Confirmed),
            (Transition::CheckIn, Confirmed) => Ok(CheckedIn),
            (Transition::CheckOut, CheckedIn) => Ok(CheckedOut),
            (Transition::Cancel, PendingPayment | Confirmed) => Ok(Cancelled),
            (Transition::Cancel, Cancelled) => Err(BookingError::conflict("Booking is already cancelled")),
            (Transition::MarkNoShow, Confirmed) => Ok(NoShow),
            (transition, from) => Err(BookingError::invalid(format!(
                "Cannot {} a booking with status {}",
                transition, from
            ))),
        }
    }

    /// Room status the room is projected to once the transition commits.
    pub fn room_status(self) -> RoomStatus {
        match self {
            Transition::Confirm => RoomStatus::Booked,
            Transition::CheckIn => RoomStatus::Occupied,
            Transition::CheckOut => RoomStatus::Cleaning,
            Transition::Cancel | Transition::MarkNoShow => RoomStatus::Available,
        }
    }

    /// Whether the booking's own room hold should be dropped.
    pub fn releases_lock(self) -> bool {
        matches!(self, Transition::Confirm | Transition::Cancel)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Transition::Confirm => "confirm",
            Transition::CheckIn => "check in",
            Transition::CheckOut => "check out",
            Transition::Cancel => "cancel",
            Transition::MarkNoShow => "mark as no-show",
        })
    }
}
