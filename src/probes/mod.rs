//! # Built-in probes
//!
//! | type     | checks                                   | needs        |
//! |----------|------------------------------------------|--------------|
//! | `tcp`    | a TCP port accepts connections           |              |
//! | `query`  | a query runs (and returns enough rows)   | query facade |
//! | `mail`   | a message is accepted for delivery       | mail facade  |
//! | `system` | host facts, optionally required paths    |              |
//!
//! Probes that need a facade fail to instantiate when it isn't configured,
//! which ends the run with an instantiation error.

pub mod mail;
pub mod query;
pub mod system;
pub mod tcp;

pub use mail::MailProbe;
pub use query::QueryProbe;
pub use system::SystemInfoProbe;
pub use tcp::TcpProbe;

use crate::core::{Probe, Registry};

pub fn register_builtins(registry: &mut Registry) {
    registry.register_probe("tcp", |id, _| Ok(Box::new(TcpProbe::new(id)) as Box<dyn Probe>));
    registry.register_probe("system", |id, _| {
        Ok(Box::new(SystemInfoProbe::new(id)) as Box<dyn Probe>)
    });
    registry.register_probe("query", |id, collaborators| {
        let executor = collaborators
            .query
            .clone()
            .ok_or_else(|| "no query executor configured (set sqlite_path)".to_string())?;
        Ok(Box::new(QueryProbe::new(id, executor)) as Box<dyn Probe>)
    });
    registry.register_probe("mail", |id, collaborators| {
        let transport = collaborators
            .mail
            .clone()
            .ok_or_else(|| "no mail transport configured (set mail_pickup_dir)".to_string())?;
        Ok(Box::new(MailProbe::new(id, transport)) as Box<dyn Probe>)
    });
}
