//! The 64-byte image header.
//!
//! The header sits at offset 0 of the root page. It is first encoded
//! with placeholder sizes while nodes are being built, then patched in
//! place once the full layout is known.
//!
//! ```text
//!  0  magic          4  total_size     8  flags (3)      12 future (0)
//! 16  signature "Compressed ROMFS"
//! 32  checksum      36  table_offset  40  table_len     44  root_entry_count
//! 48  name "Compressed" + 6 zero bytes
//! ```

pub const HEADER_SIZE: usize = 64;

pub const MAGIC: u32 = 0x28CD_3D45;
pub const FLAGS: u32 = 3;
pub const SIGNATURE: [u8; 16] = *b"Compressed ROMFS";
pub const NAME: [u8; 16] = *b"Compressed\0\0\0\0\0\0";

/// Value stored in the checksum field when no checksum is computed.
pub const CHECKSUM_PLACEHOLDER: u32 = 0xFFFF_FFFF;

pub const TOTAL_SIZE_AT: usize = 4;
pub const CHECKSUM_AT: usize = 32;
pub const TABLE_OFFSET_AT: usize = 36;
pub const TABLE_LEN_AT: usize = 40;
pub const ENTRY_COUNT_AT: usize = 44;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub total_size: u32,
    pub flags: u32,
    pub future: u32,
    pub checksum: u32,
    pub table_offset: u32,
    pub table_len: u32,
    pub root_entry_count: u32,
}

impl Header {
    /// Header as written into the root page before layout is known.
    pub fn placeholder() -> Self {
        Self {
            total_size: 0,
            flags: FLAGS,
            future: 0,
            checksum: 0,
            table_offset: 0,
            table_len: 0,
            root_entry_count: 0,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&MAGIC.to_le_bytes());
        buf[4..8].copy_from_slice(&self.total_size.to_le_bytes());
        buf[8..12].copy_from_slice(&self.flags.to_le_bytes());
        buf[12..16].copy_from_slice(&self.future.to_le_bytes());
        buf[16..32].copy_from_slice(&SIGNATURE);
        buf[32..36].copy_from_slice(&self.checksum.to_le_bytes());
        buf[36..40].copy_from_slice(&self.table_offset.to_le_bytes());
        buf[40..44].copy_from_slice(&self.table_len.to_le_bytes());
        buf[44..48].copy_from_slice(&self.root_entry_count.to_le_bytes());
        buf[48..64].copy_from_slice(&NAME);
        buf
    }

    /// Read a header back from the start of an image.
    ///
    /// Returns `None` if the buffer is too short or the magic, signature
    /// or name do not match.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_SIZE
            || read_u32(bytes, 0) != MAGIC
            || bytes[16..32] != SIGNATURE
            || bytes[48..64] != NAME
        {
            return None;
        }
        Some(Self {
            total_size: read_u32(bytes, TOTAL_SIZE_AT),
            flags: read_u32(bytes, 8),
            future: read_u32(bytes, 12),
            checksum: read_u32(bytes, CHECKSUM_AT),
            table_offset: read_u32(bytes, TABLE_OFFSET_AT),
            table_len: read_u32(bytes, TABLE_LEN_AT),
            root_entry_count: read_u32(bytes, ENTRY_COUNT_AT),
        })
    }
}

/// Overwrite a little-endian u32 field in an encoded image.
pub(crate) fn patch_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn read_u32(buf: &[u8], at: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[at..at + 4]);
    u32::from_le_bytes(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_layout() {
        let bytes = Header::placeholder().encode();

        assert_eq!(&bytes[0..4], &[0x45, 0x3D, 0xCD, 0x28]);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &[3, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &[0, 0, 0, 0]);
        assert_eq!(&bytes[16..32], b"Compressed ROMFS");
        assert!(bytes[32..48].iter().all(|b| *b == 0));
        assert_eq!(&bytes[48..58], b"Compressed");
        assert!(bytes[58..64].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_patch_fields() {
        let mut bytes = Header::placeholder().encode().to_vec();
        patch_u32(&mut bytes, TOTAL_SIZE_AT, 0x3000);
        patch_u32(&mut bytes, ENTRY_COUNT_AT, 3);
        patch_u32(&mut bytes, CHECKSUM_AT, CHECKSUM_PLACEHOLDER);

        assert_eq!(&bytes[4..8], &[0x00, 0x30, 0x00, 0x00]);
        assert_eq!(&bytes[32..36], &[0xFF; 4]);

        let header = Header::decode(&bytes).unwrap();
        assert_eq!(header.total_size, 0x3000);
        assert_eq!(header.root_entry_count, 3);
        assert_eq!(header.checksum, CHECKSUM_PLACEHOLDER);
        assert_eq!(header.flags, FLAGS);
    }

    #[test]
    fn test_decode_rejects_foreign_bytes() {
        assert!(Header::decode(&[0u8; 16]).is_none());

        let mut bytes = Header::placeholder().encode();
        bytes[0] ^= 0xFF;
        assert!(Header::decode(&bytes).is_none());
    }
}
