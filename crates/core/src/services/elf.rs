use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::model::StrippedLevel;

const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Reads build-ids and section names from binaries.
///
/// Implementations never fail: unreadable or non-ELF files have an empty
/// build-id and no sections.
pub trait ElfInspector {
    /// Normalized build-id of the file, or an empty string.
    fn build_id(&self, path: &Path) -> String;

    fn sections(&self, path: &Path) -> BTreeSet<String>;

    fn name(&self) -> &'static str;

    fn stripped_level(&self, path: &Path) -> StrippedLevel {
        StrippedLevel::from_sections(self.sections(path))
    }
}

/// True if the file starts with the ELF magic.
pub fn is_elf_file(path: &Path) -> bool {
    let mut magic = [0u8; 4];
    match File::open(path) {
        Ok(mut file) => file.read_exact(&mut magic).is_ok() && magic == ELF_MAGIC,
        Err(_) => false,
    }
}
