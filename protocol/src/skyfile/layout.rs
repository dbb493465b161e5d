//! The fixed 99-byte layout prefix of a base sector.
//!
//! ```text
//!  off  len  field
//!    0    1  version
//!    1    8  file size            (u64 LE)
//!    9    8  metadata size        (u64 LE)
//!   17    8  fanout size          (u64 LE)
//!   25    1  fanout data pieces
//!   26    1  fanout parity pieces
//!   27    8  cipher type
//!   35   64  cipher key data
//! ```

use super::SkyfileError;
use crate::config::{CIPHER_TYPE_PLAINTEXT, LAYOUT_SIZE, LAYOUT_VERSION};
use crate::encoding::{decode_u64, encode_u64};

const CIPHER_TYPE_LEN: usize = 8;
const KEY_DATA_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkyfileLayout {
    pub version: u8,
    pub file_size: u64,
    pub metadata_size: u64,
    pub fanout_size: u64,
    pub fanout_data_pieces: u8,
    pub fanout_parity_pieces: u8,
    pub cipher_type: [u8; CIPHER_TYPE_LEN],
    pub key_data: [u8; KEY_DATA_LEN],
}

impl SkyfileLayout {
    /// Layout for an unencrypted small file with no fanout.
    pub fn plaintext(file_size: u64, metadata_size: u64) -> Self {
        let mut cipher_type = [0u8; CIPHER_TYPE_LEN];
        cipher_type[CIPHER_TYPE_LEN - 1] = CIPHER_TYPE_PLAINTEXT;
        Self {
            version: LAYOUT_VERSION,
            file_size,
            metadata_size,
            fanout_size: 0,
            fanout_data_pieces: 0,
            fanout_parity_pieces: 0,
            cipher_type,
            key_data: [0u8; KEY_DATA_LEN],
        }
    }

    /// Decode the first [`LAYOUT_SIZE`] bytes of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, SkyfileError> {
        if bytes.len() < LAYOUT_SIZE {
            return Err(SkyfileError::LayoutTooShort(bytes.len()));
        }
        let u64_at = |start: usize| decode_u64(&bytes[start..start + 8]);
        let mut cipher_type = [0u8; CIPHER_TYPE_LEN];
        cipher_type.copy_from_slice(&bytes[27..35]);
        let mut key_data = [0u8; KEY_DATA_LEN];
        key_data.copy_from_slice(&bytes[35..LAYOUT_SIZE]);

        Ok(Self {
            version: bytes[0],
            file_size: u64_at(1)?,
            metadata_size: u64_at(9)?,
            fanout_size: u64_at(17)?,
            fanout_data_pieces: bytes[25],
            fanout_parity_pieces: bytes[26],
            cipher_type,
            key_data,
        })
    }

    pub fn encode(&self) -> [u8; LAYOUT_SIZE] {
        let mut out = [0u8; LAYOUT_SIZE];
        out[0] = self.version;
        out[1..9].copy_from_slice(&encode_u64(self.file_size));
        out[9..17].copy_from_slice(&encode_u64(self.metadata_size));
        out[17..25].copy_from_slice(&encode_u64(self.fanout_size));
        out[25] = self.fanout_data_pieces;
        out[26] = self.fanout_parity_pieces;
        out[27..35].copy_from_slice(&self.cipher_type);
        out[35..].copy_from_slice(&self.key_data);
        out
    }

    /// Where the file bytes start, relative to the start of the layout.
    /// `None` on overflow, which only a hostile layout can produce.
    pub fn file_offset(&self) -> Option<u64> {
        (LAYOUT_SIZE as u64)
            .checked_add(self.metadata_size)?
            .checked_add(self.fanout_size)
    }
}
