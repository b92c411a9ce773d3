//! Attribution for the methods a run relies on.

use std::fmt;

/// A literature reference for a simulation method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub key: &'static str,
    pub authors: &'static str,
    pub title: &'static str,
    pub journal: &'static str,
    pub volume: u32,
    pub pages: &'static str,
    pub year: u16,
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{}\n{} {} ({}) pp. {}",
            self.authors, self.title, self.journal, self.volume, self.year, self.pages
        )
    }
}

/// Applied time-dependent electric fields.
pub const CALEMAN_2008: Citation = Citation {
    key: "Caleman2008a",
    authors: "C. Caleman and D. van der Spoel",
    title: "Picosecond Melting of Ice by an Infrared Laser Pulse: A Simulation Study",
    journal: "Angew. Chem. Int. Ed",
    volume: 47,
    pages: "1417-1420",
    year: 2008,
};

/// Collects the citations surfaced during startup, each once.
#[derive(Debug, Default)]
pub struct CitationRegistry {
    cited: Vec<Citation>,
}

impl CitationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface `citation` unless it has been surfaced already.
    ///
    /// Returns whether the citation was new.
    pub fn cite(&mut self, citation: &Citation) -> bool {
        if self.cited.iter().any(|c| c.key == citation.key) {
            return false;
        }
        log::info!("Please cite:\n{}", citation);
        self.cited.push(citation.clone());
        true
    }

    pub fn citations(&self) -> &[Citation] {
        &self.cited
    }
}
