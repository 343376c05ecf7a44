//! Key-value commands.
//!
//! Each command is routed by its key and returns the reply in the shape the
//! command defines. `Ok(None)` from a read means the key (or field) is
//! absent; a failed request is always an `Err`.

use std::time::Duration;

use bytes::Bytes;

use crate::client::Client;
use crate::connection::{Command, Connector, Reply};
use crate::error::{ClientError, Result};

impl<K: Connector> Client<K> {
    pub fn set(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        let key = key.as_ref();
        let command = Command::new("SET").arg(key).arg(value);
        expect_ok(&command, self.execute(key, &command)?)
    }

    /// `SET` with an expiry in seconds. A fractional second rounds up.
    pub fn setex(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>, ttl: Duration) -> Result<()> {
        let key = key.as_ref();
        let command = Command::new("SETEX")
            .arg(key)
            .arg(ttl_seconds(ttl)?.to_string())
            .arg(value);
        expect_ok(&command, self.execute(key, &command)?)
    }

    /// `SET` with an expiry in milliseconds. A fractional millisecond rounds up.
    pub fn psetex(
        &self,
        key: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
        ttl: Duration,
    ) -> Result<()> {
        let key = key.as_ref();
        let command = Command::new("PSETEX")
            .arg(key)
            .arg(ttl_millis(ttl)?.to_string())
            .arg(value);
        expect_ok(&command, self.execute(key, &command)?)
    }

    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<Option<Bytes>> {
        let key = key.as_ref();
        let command = Command::new("GET").arg(key);
        expect_value(&command, self.execute(key, &command)?)
    }

    /// Number of keys removed.
    pub fn del(&self, key: impl AsRef<[u8]>) -> Result<u64> {
        let key = key.as_ref();
        let command = Command::new("DEL").arg(key);
        expect_count(&command, self.execute(key, &command)?)
    }

    pub fn incr(&self, key: impl AsRef<[u8]>) -> Result<i64> {
        let key = key.as_ref();
        let command = Command::new("INCR").arg(key);
        expect_integer(&command, self.execute(key, &command)?)
    }

    pub fn incrby(&self, key: impl AsRef<[u8]>, amount: i64) -> Result<i64> {
        let key = key.as_ref();
        let command = Command::new("INCRBY").arg(key).arg(amount.to_string());
        expect_integer(&command, self.execute(key, &command)?)
    }

    pub fn decr(&self, key: impl AsRef<[u8]>) -> Result<i64> {
        let key = key.as_ref();
        let command = Command::new("DECR").arg(key);
        expect_integer(&command, self.execute(key, &command)?)
    }

    pub fn decrby(&self, key: impl AsRef<[u8]>, amount: i64) -> Result<i64> {
        let key = key.as_ref();
        let command = Command::new("DECRBY").arg(key).arg(amount.to_string());
        expect_integer(&command, self.execute(key, &command)?)
    }

    /// Number of fields newly created.
    pub fn hset(
        &self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<u64> {
        let key = key.as_ref();
        let command = Command::new("HSET").arg(key).arg(field).arg(value);
        expect_count(&command, self.execute(key, &command)?)
    }

    pub fn hget(&self, key: impl AsRef<[u8]>, field: impl AsRef<[u8]>) -> Result<Option<Bytes>> {
        let key = key.as_ref();
        let command = Command::new("HGET").arg(key).arg(field);
        expect_value(&command, self.execute(key, &command)?)
    }

    pub fn exists(&self, key: impl AsRef<[u8]>) -> Result<bool> {
        let key = key.as_ref();
        let command = Command::new("EXISTS").arg(key);
        expect_flag(&command, self.execute(key, &command)?)
    }

    /// Sets a timeout in seconds, rounding a fractional second up. `false`
    /// if the key does not exist.
    pub fn expire(&self, key: impl AsRef<[u8]>, ttl: Duration) -> Result<bool> {
        let key = key.as_ref();
        let command = Command::new("EXPIRE")
            .arg(key)
            .arg(ttl_seconds(ttl)?.to_string());
        expect_flag(&command, self.execute(key, &command)?)
    }
}

/// The backend takes a positive whole number of seconds.
fn ttl_seconds(ttl: Duration) -> Result<u64> {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    if secs == 0 {
        return Err(ClientError::InvalidTtl(ttl));
    }
    Ok(secs)
}

fn ttl_millis(ttl: Duration) -> Result<u128> {
    let millis = ttl.as_millis() + u128::from(ttl.subsec_nanos() % 1_000_000 > 0);
    if millis == 0 {
        return Err(ClientError::InvalidTtl(ttl));
    }
    Ok(millis)
}

fn unexpected(command: &Command, reply: Reply) -> ClientError {
    ClientError::UnexpectedReply {
        command: command.name(),
        reply,
    }
}

fn expect_ok(command: &Command, reply: Reply) -> Result<()> {
    match reply {
        Reply::Status(_) => Ok(()),
        other => Err(unexpected(command, other)),
    }
}

fn expect_value(command: &Command, reply: Reply) -> Result<Option<Bytes>> {
    match reply {
        Reply::Nil => Ok(None),
        Reply::Bulk(value) => Ok(Some(value)),
        other => Err(unexpected(command, other)),
    }
}

fn expect_integer(command: &Command, reply: Reply) -> Result<i64> {
    match reply {
        Reply::Integer(n) => Ok(n),
        other => Err(unexpected(command, other)),
    }
}

fn expect_count(command: &Command, reply: Reply) -> Result<u64> {
    match reply {
        Reply::Integer(n) if n >= 0 => Ok(n as u64),
        other => Err(unexpected(command, other)),
    }
}

fn expect_flag(command: &Command, reply: Reply) -> Result<bool> {
    match reply {
        Reply::Integer(n) => Ok(n > 0),
        other => Err(unexpected(command, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_shapes() {
        let get = Command::new("GET").arg("k");
        assert_eq!(expect_value(&get, Reply::Nil).unwrap(), None);
        assert_eq!(
            expect_value(&get, Reply::Bulk(Bytes::from_static(b"v"))).unwrap(),
            Some(Bytes::from_static(b"v"))
        );
        assert!(expect_ok(&get, Reply::Status("OK".to_owned())).is_ok());
        assert_eq!(expect_integer(&get, Reply::Integer(-3)).unwrap(), -3);
        assert_eq!(expect_count(&get, Reply::Integer(2)).unwrap(), 2);
        assert!(expect_flag(&get, Reply::Integer(1)).unwrap());
        assert!(!expect_flag(&get, Reply::Integer(0)).unwrap());
    }

    #[test]
    fn test_wrong_shape_names_the_command() {
        let incr = Command::new("INCR").arg("k");
        match expect_integer(&incr, Reply::Nil) {
            Err(ClientError::UnexpectedReply { command, reply }) => {
                assert_eq!(command, "INCR");
                assert_eq!(reply, Reply::Nil);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(expect_count(&incr, Reply::Integer(-1)).is_err());
    }

    #[test]
    fn test_ttl_rounds_up() {
        assert_eq!(ttl_seconds(Duration::from_secs(30)).unwrap(), 30);
        assert_eq!(ttl_seconds(Duration::from_millis(500)).unwrap(), 1);
        assert_eq!(ttl_seconds(Duration::from_millis(1900)).unwrap(), 2);
        assert_eq!(ttl_seconds(Duration::from_nanos(1)).unwrap(), 1);
        assert_eq!(ttl_millis(Duration::from_millis(1500)).unwrap(), 1500);
        assert_eq!(ttl_millis(Duration::from_micros(1500)).unwrap(), 2);
        assert_eq!(ttl_millis(Duration::from_nanos(1)).unwrap(), 1);
    }

    #[test]
    fn test_zero_ttl_is_rejected() {
        assert!(matches!(
            ttl_seconds(Duration::ZERO),
            Err(ClientError::InvalidTtl(ttl)) if ttl.is_zero()
        ));
        assert!(matches!(
            ttl_millis(Duration::ZERO),
            Err(ClientError::InvalidTtl(_))
        ));
    }
}
