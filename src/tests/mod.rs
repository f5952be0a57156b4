use super::*;

mod enhance_password_meter;
mod events_and_dispatch;
mod timers_and_clock;
