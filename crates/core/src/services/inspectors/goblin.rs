use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use goblin::elf::note::NT_GNU_BUILD_ID;
use goblin::elf::Elf;

use crate::model::normalize_build_id;
use crate::services::elf::{is_elf_file, ElfInspector};

/// In-process inspector backed by goblin.
///
/// Needs no external toolchain, which makes it the practical choice on hosts
/// without `llvm-readelf`.
pub struct GoblinInspector;

impl GoblinInspector {
    fn load(path: &Path) -> Option<Vec<u8>> {
        if !is_elf_file(path) {
            return None;
        }
        fs::read(path).ok()
    }
}

impl ElfInspector for GoblinInspector {
    fn build_id(&self, path: &Path) -> String {
        let Some(bytes) = Self::load(path) else {
            return String::new();
        };
        let Ok(elf) = Elf::parse(&bytes) else {
            return String::new();
        };
        let notes = elf.iter_note_sections(&bytes, None).or_else(|| elf.iter_note_headers(&bytes));
        let Some(notes) = notes else {
            return String::new();
        };
        for note in notes.flatten() {
            if note.n_type == NT_GNU_BUILD_ID && !note.desc.is_empty() {
                let hex: String = note.desc.iter().map(|b| format!("{b:02x}")).collect();
                return normalize_build_id(&hex);
            }
        }
        String::new()
    }

    fn sections(&self, path: &Path) -> BTreeSet<String> {
        let Some(bytes) = Self::load(path) else {
            return BTreeSet::new();
        };
        let Ok(elf) = Elf::parse(&bytes) else {
            return BTreeSet::new();
        };
        elf.section_headers
            .iter()
            .filter_map(|sh| elf.shdr_strtab.get_at(sh.sh_name))
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn name(&self) -> &'static str {
        "goblin"
    }
}
