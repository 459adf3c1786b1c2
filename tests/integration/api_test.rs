//! API endpoint integration tests
//!
//! Tests for all waitlist-domain API endpoints: entries, lottery, notifications.

#![allow(dead_code)]

mod common;
mod entries;
mod lottery;
mod notifications;
