//! POSIX file type and permission bits as stored in node records.
//!
//! Only [`DIR_MODE`] and [`FILE_MODE`] are ever assigned to nodes. The
//! remaining type bits are kept so a table consumer can decode the full
//! `st_mode` space.

pub const S_IFSOCK: u32 = 0o140000;
pub const S_IFLNK: u32 = 0o120000;
pub const S_IFREG: u32 = 0o100000;
pub const S_IFBLK: u32 = 0o060000;
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFCHR: u32 = 0o020000;
pub const S_IFIFO: u32 = 0o010000;
pub const S_IFMT: u32 = 0o170000;

pub const S_ISUID: u32 = 0o4000;
pub const S_ISGID: u32 = 0o2000;
pub const S_ISVTX: u32 = 0o1000;

pub const S_IRWXU: u32 = 0o700;
pub const S_IRWXG: u32 = 0o070;
pub const S_IRWXO: u32 = 0o007;

/// Permission bits only (`rwxrwxrwx`).
pub const PERM_MASK: u32 = S_IRWXU | S_IRWXG | S_IRWXO;

pub const DEFAULT_DIR_PERM: u32 = 0o755;
pub const DEFAULT_FILE_PERM: u32 = 0o644;

/// Mode for the root and every sub-directory.
pub const DIR_MODE: u32 = DEFAULT_DIR_PERM | S_IFDIR;

/// Mode for every regular file. The sticky bit is always set.
pub const FILE_MODE: u32 = DEFAULT_FILE_PERM | S_IFREG | S_ISVTX;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_modes() {
        assert_eq!(DIR_MODE, 0x41ED);
        assert_eq!(FILE_MODE, 0x83A4);
        assert_eq!(DIR_MODE & S_IFMT, S_IFDIR);
        assert_eq!(FILE_MODE & S_IFMT, S_IFREG);
        assert_eq!(FILE_MODE & PERM_MASK, 0o644);
        assert_ne!(FILE_MODE & S_ISVTX, 0);
    }
}
