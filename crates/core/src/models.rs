pub mod clock;
pub mod operating_hours;
pub mod slot_type;
pub mod weekday;
