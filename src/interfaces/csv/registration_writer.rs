use crate::domain::registration::{PaymentStatus, Registration};
use crate::error::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

/// One CSV row per registration.
#[derive(Serialize)]
struct RegistrationRow<'a> {
    id: &'a str,
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    race_category: &'a str,
    shirt_size: &'a str,
    amount: Decimal,
    payment_status: PaymentStatus,
    coupon_code: &'a str,
    created_at: Option<DateTime<Utc>>,
}

impl<'a> From<&'a Registration> for RegistrationRow<'a> {
    fn from(registration: &'a Registration) -> Self {
        Self {
            id: &registration.id,
            name: &registration.participant.name,
            email: &registration.participant.email,
            phone: &registration.participant.phone,
            race_category: &registration.participant.race_category,
            shirt_size: &registration.participant.shirt_size,
            amount: registration.amount,
            payment_status: registration.payment_status,
            coupon_code: registration.coupon_code.as_deref().unwrap_or_default(),
            created_at: registration.created_at,
        }
    }
}

/// Writes registrations as CSV to any `Write` sink (e.g. stdout).
pub struct RegistrationWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> RegistrationWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes the header (with the first row) and one row per registration.
    pub fn write_registrations<'a, I>(&mut self, registrations: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Registration>,
    {
        for registration in registrations {
            self.writer.serialize(RegistrationRow::from(registration))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
