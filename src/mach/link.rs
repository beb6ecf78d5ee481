use super::Address;
use crate::error;
use crate::lang::{Error, LineNumber};
use std::collections::HashMap;

type Result<T> = std::result::Result<T, Error>;

/// Address field of a jump waiting for its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchSite {
    pub at: Address,
    pub line: LineNumber,
}

#[derive(Debug, Default)]
struct Label {
    address: Option<Address>,
    sites: Vec<PatchSite>,
}

/// ## Label resolution
///
/// `GOTO` may name a label defined further down. Every reference is
/// recorded and written once the whole program has been emitted.

#[derive(Debug, Default)]
pub struct Link {
    labels: HashMap<String, Label>,
}

impl Link {
    pub fn new() -> Link {
        Link::default()
    }

    pub fn define(&mut self, name: &str, address: Address, line: LineNumber) -> Result<()> {
        let label = self.labels.entry(name.to_ascii_lowercase()).or_default();
        if label.address.is_some() {
            return Err(error!(DuplicateLabel, line));
        }
        label.address = Some(address);
        Ok(())
    }

    pub fn reference(&mut self, name: &str, at: Address, line: LineNumber) {
        let label = self.labels.entry(name.to_ascii_lowercase()).or_default();
        label.sites.push(PatchSite { at, line });
    }

    /// Write every label address into `code`. Reports the earliest
    /// reference to a label which was never defined.
    pub fn link(&mut self, code: &mut [u8]) -> Result<()> {
        let mut missing: Option<LineNumber> = None;
        for (_, label) in self.labels.drain() {
            match label.address {
                Some(address) => {
                    let bytes = (address as u16).to_le_bytes();
                    for site in label.sites {
                        match code.get_mut(site.at..site.at + 2) {
                            Some(field) => field.copy_from_slice(&bytes),
                            None => return Err(error!(InvalidOperation, site.line; "LINK FAILURE")),
                        }
                    }
                }
                None => {
                    for site in label.sites {
                        missing = match missing {
                            Some(line) if line <= site.line => Some(line),
                            _ => Some(site.line),
                        };
                    }
                }
            }
        }
        match missing {
            Some(line) => Err(error!(MissingLabel, line)),
            None => Ok(()),
        }
    }
}
