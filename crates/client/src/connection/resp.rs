//! RESP2 over TCP.
//!
//! A deliberately small client: commands go out as arrays of bulk strings,
//! replies are parsed from a buffered reader. Anything that does not frame
//! correctly is a [`ConnectionError::Malformed`].

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};

use bytes::{BufMut, Bytes, BytesMut};
use corelib::Endpoint;

use super::{Command, ConnectOptions, Connection, ConnectionError, Connector, Reply};

/// Opens [`RespConnection`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct RespConnector;

impl Connector for RespConnector {
    type Connection = RespConnection;

    fn connect(
        &self,
        endpoint: &Endpoint,
        options: &ConnectOptions,
    ) -> Result<RespConnection, ConnectionError> {
        let addrs = (endpoint.host.as_str(), endpoint.port).to_socket_addrs()?;
        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, options.connect_timeout) {
                Ok(stream) => return RespConnection::new(stream, options),
                Err(err) => last_err = Some(err),
            }
        }
        Err(match last_err {
            Some(err) => ConnectionError::Io(err),
            None => ConnectionError::Unreachable(endpoint.to_string()),
        })
    }
}

/// One TCP connection speaking RESP2.
#[derive(Debug)]
pub struct RespConnection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    buf: BytesMut,
}

impl RespConnection {
    pub fn new(stream: TcpStream, options: &ConnectOptions) -> Result<Self, ConnectionError> {
        stream.set_nodelay(true)?;
        stream.set_read_timeout(options.command_timeout)?;
        stream.set_write_timeout(options.command_timeout)?;
        let writer = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
            buf: BytesMut::with_capacity(256),
        })
    }
}

impl Connection for RespConnection {
    fn authenticate(&mut self, credential: &str) -> Result<(), ConnectionError> {
        match self.execute(&Command::new("AUTH").arg(credential))? {
            Reply::Error(msg) => Err(ConnectionError::Rejected(msg)),
            _ => Ok(()),
        }
    }

    fn execute(&mut self, command: &Command) -> Result<Reply, ConnectionError> {
        self.buf.clear();
        encode_command(command, &mut self.buf);
        self.writer.write_all(&self.buf)?;
        self.writer.flush()?;
        read_reply(&mut self.reader)
    }

    fn close(&mut self) {
        // The peer may already be gone.
        let _ = self.writer.shutdown(Shutdown::Both);
    }
}

/// Appends `command` to `buf` as a RESP array of bulk strings.
pub fn encode_command(command: &Command, buf: &mut BytesMut) {
    buf.put_slice(format!("*{}\r\n", command.args().len()).as_bytes());
    for arg in command.args() {
        buf.put_slice(format!("${}\r\n", arg.len()).as_bytes());
        buf.put_slice(arg);
        buf.put_slice(b"\r\n");
    }
}

/// Largest bulk string accepted, the backend's default `proto-max-bulk-len`.
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Largest array accepted, counted in elements.
pub const MAX_ARRAY_LEN: usize = 1024 * 1024;

const MAX_DEPTH: usize = 32;

/// Reads one complete reply.
pub fn read_reply<R: BufRead>(reader: &mut R) -> Result<Reply, ConnectionError> {
    read_nested(reader, 0)
}

fn read_nested<R: BufRead>(reader: &mut R, depth: usize) -> Result<Reply, ConnectionError> {
    let line = read_line(reader)?;
    let (tag, body) = line
        .split_first()
        .ok_or_else(|| ConnectionError::Malformed("empty reply line".to_owned()))?;
    match tag {
        b'+' => Ok(Reply::Status(text(body)?)),
        b'-' => Ok(Reply::Error(text(body)?)),
        b':' => Ok(Reply::Integer(integer(body)?)),
        b'$' => {
            let Some(len) = length(body, MAX_BULK_LEN)? else {
                return Ok(Reply::Nil);
            };
            // Grows with what actually arrives instead of trusting the header.
            let mut data = Vec::new();
            reader.by_ref().take(len as u64 + 2).read_to_end(&mut data)?;
            if data.len() < len + 2 {
                return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
            }
            if &data[len..] != b"\r\n" {
                return Err(ConnectionError::Malformed(
                    "bulk string not terminated by CRLF".to_owned(),
                ));
            }
            data.truncate(len);
            Ok(Reply::Bulk(Bytes::from(data)))
        }
        b'*' => {
            let Some(count) = length(body, MAX_ARRAY_LEN)? else {
                return Ok(Reply::Nil);
            };
            if depth >= MAX_DEPTH {
                return Err(ConnectionError::Malformed("arrays nested too deep".to_owned()));
            }
            (0..count)
                .map(|_| read_nested(reader, depth + 1))
                .collect::<Result<Vec<_>, _>>()
                .map(Reply::Array)
        }
        other => Err(ConnectionError::Malformed(format!(
            "unknown reply type {:?}",
            char::from(*other)
        ))),
    }
}

/// Parses a bulk or array header. `-1` is the null reply; any other negative
/// value, or one above `max`, does not frame.
fn length(body: &[u8], max: usize) -> Result<Option<usize>, ConnectionError> {
    match integer(body)? {
        -1 => Ok(None),
        n => usize::try_from(n)
            .ok()
            .filter(|n| *n <= max)
            .map(Some)
            .ok_or_else(|| ConnectionError::Malformed(format!("length {n} out of range"))),
    }
}

fn read_line<R: BufRead>(reader: &mut R) -> Result<Vec<u8>, ConnectionError> {
    let mut line = Vec::new();
    if reader.read_until(b'\n', &mut line)? == 0 {
        return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
    }
    if !line.ends_with(b"\r\n") {
        return Err(ConnectionError::Malformed("line not terminated by CRLF".to_owned()));
    }
    line.truncate(line.len() - 2);
    Ok(line)
}

fn text(body: &[u8]) -> Result<String, ConnectionError> {
    String::from_utf8(body.to_vec()).map_err(|e| ConnectionError::Malformed(e.to_string()))
}

fn integer(body: &[u8]) -> Result<i64, ConnectionError> {
    text(body)?
        .parse()
        .map_err(|e: std::num::ParseIntError| ConnectionError::Malformed(e.to_string()))
}
