//! Token persistence in a fixed-layout NVM record.
//!
//! Layout, starting at offset 0 of the region:
//!
//! | bytes      | field         |
//! |------------|---------------|
//! | [0, 208)   | access token  |
//! | [208, 339) | refresh token |
//!
//! Both fields are always written together in one call. Lengths are not
//! validated: a pair that does not add up to [`RECORD_LEN`] bytes shifts or
//! truncates the neighbouring field.
use crate::error::StoreError;
use crate::nvm::Nvm;
use tracing::{debug, info, warn};

pub const ACCESS_TOKEN_LEN: usize = 208;
pub const REFRESH_TOKEN_LEN: usize = 131;
pub const RECORD_LEN: usize = ACCESS_TOKEN_LEN + REFRESH_TOKEN_LEN;
const RECORD_OFFSET: usize = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenRecord {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Concatenation of both tokens; exactly [`RECORD_LEN`] bytes only when
    /// the tokens have their expected lengths.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.access_token.len() + self.refresh_token.len());
        out.extend_from_slice(self.access_token.as_bytes());
        out.extend_from_slice(self.refresh_token.as_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8; RECORD_LEN]) -> Result<Self, StoreError> {
        let (access, refresh) = bytes.split_at(ACCESS_TOKEN_LEN);
        Ok(Self {
            access_token: decode_field("access token", access)?,
            refresh_token: decode_field("refresh token", refresh)?,
        })
    }
}

fn decode_field(field: &'static str, bytes: &[u8]) -> Result<String, StoreError> {
    String::from_utf8(bytes.to_vec()).map_err(|source| StoreError::Decode { field, source })
}

/// Reads and writes the token record in an [`Nvm`] region.
#[derive(Debug)]
pub struct TokenStore<N> {
    nvm: N,
}

impl<N: Nvm> TokenStore<N> {
    pub fn new(nvm: N) -> Self {
        Self { nvm }
    }

    pub fn nvm(&self) -> &N {
        &self.nvm
    }

    pub fn into_inner(self) -> N {
        self.nvm
    }

    /// Write both tokens as one record. Bytes past [`RECORD_LEN`] are
    /// dropped; a short pair leaves the tail of the previous record in place.
    pub fn write(&mut self, access_token: &str, refresh_token: &str) -> Result<(), StoreError> {
        let bytes = TokenRecord::new(access_token, refresh_token).to_bytes();
        if access_token.len() != ACCESS_TOKEN_LEN || refresh_token.len() != REFRESH_TOKEN_LEN {
            warn!(
                "token lengths {}/{} differ from the {}/{} record layout; stored record will be misaligned",
                access_token.len(),
                refresh_token.len(),
                ACCESS_TOKEN_LEN,
                REFRESH_TOKEN_LEN
            );
        }
        let n = bytes.len().min(RECORD_LEN);
        self.nvm.write(RECORD_OFFSET, &bytes[..n])?;
        info!("wrote {} byte token record to nvm", n);
        Ok(())
    }

    pub fn write_record(&mut self, record: &TokenRecord) -> Result<(), StoreError> {
        self.write(&record.access_token, &record.refresh_token)
    }

    pub fn read(&self) -> Result<TokenRecord, StoreError> {
        let mut buf = [0u8; RECORD_LEN];
        self.nvm.read(RECORD_OFFSET, &mut buf)?;
        TokenRecord::from_bytes(&buf)
    }

    pub fn read_access(&self) -> Result<String, StoreError> {
        let bytes = self.nvm.read_vec(RECORD_OFFSET, ACCESS_TOKEN_LEN)?;
        decode_field("access token", &bytes)
    }

    pub fn read_refresh(&self) -> Result<String, StoreError> {
        let bytes = self
            .nvm
            .read_vec(RECORD_OFFSET + ACCESS_TOKEN_LEN, REFRESH_TOKEN_LEN)?;
        decode_field("refresh token", &bytes)
    }

    /// Zero the whole region, not just the token record.
    ///
    /// Development only: anything else persisted in the same region is lost.
    pub fn wipe(&mut self) -> Result<(), StoreError> {
        let size = self.nvm.len();
        debug!("wiping {} bytes of nvm", size);
        self.nvm.write(0, &vec![0u8; size])?;
        warn!("nvm wiped ({} bytes zeroed)", size);
        Ok(())
    }
}
