//! The one verb this layer of the system reserves: `start`. Every other
//! verb belongs to the external-collaborator surface (spec §4.3) and is
//! passed through as [`Request::Other`] for a higher layer to route, or
//! dropped as a protocol violation if nothing claims it.

use crate::wire::{decode_argv, WireError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `start <name> [args...]` — daemonise a named service.
    Start { name: String, args: Vec<String> },
    /// Any other verb, forwarded unexamined.
    Other { verb: String, args: Vec<String> },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RequestError {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("message has no verb")]
    NoVerb,

    #[error("'start' requires a service name")]
    StartMissingName,
}

impl Request {
    /// Decode a raw message body into a [`Request`].
    pub fn decode(buf: &[u8]) -> Result<Self, RequestError> {
        let argv = decode_argv(buf)?;
        Self::from_argv(argv)
    }

    pub fn from_argv(argv: Vec<String>) -> Result<Self, RequestError> {
        let mut it = argv.into_iter();
        let verb = it.next().ok_or(RequestError::NoVerb)?;
        let rest: Vec<String> = it.collect();

        if verb == "start" {
            let mut rest = rest.into_iter();
            let name = rest.next().ok_or(RequestError::StartMissingName)?;
            Ok(Request::Start {
                name,
                args: rest.collect(),
            })
        } else {
            Ok(Request::Other { verb, args: rest })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_start_with_no_trailing_args() {
        let req = Request::from_argv(vec!["start".into(), "mydaemon".into()]).unwrap();
        assert_eq!(
            req,
            Request::Start {
                name: "mydaemon".into(),
                args: vec![],
            }
        );
    }

    #[test]
    fn parses_start_with_trailing_args() {
        let req =
            Request::from_argv(vec!["start".into(), "mydaemon".into(), "--foo".into()]).unwrap();
        assert_eq!(
            req,
            Request::Start {
                name: "mydaemon".into(),
                args: vec!["--foo".into()],
            }
        );
    }

    #[test]
    fn start_without_a_name_is_an_error() {
        assert_eq!(
            Request::from_argv(vec!["start".into()]),
            Err(RequestError::StartMissingName)
        );
    }

    #[test]
    fn unrecognised_verb_is_passed_through_as_other() {
        let req = Request::from_argv(vec!["stop".into(), "mydaemon".into()]).unwrap();
        assert_eq!(
            req,
            Request::Other {
                verb: "stop".into(),
                args: vec!["mydaemon".into()],
            }
        );
    }

    #[test]
    fn empty_argv_has_no_verb() {
        assert_eq!(Request::from_argv(vec![]), Err(RequestError::NoVerb));
    }

    #[test]
    fn decode_end_to_end_from_wire_bytes() {
        let req = Request::decode(b"start\0mydaemon\0").unwrap();
        assert_eq!(
            req,
            Request::Start {
                name: "mydaemon".into(),
                args: vec![],
            }
        );
    }
}
