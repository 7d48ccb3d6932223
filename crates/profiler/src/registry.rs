//! Named sections and their sample buffers.

use crate::ring_buffer::RingBuffer;
use std::collections::HashMap;

/// Category shared by every self-overhead section.
pub const PROFILER_CATEGORY: &str = "profiler";

/// Category used when a caller does not pick one.
pub const DEFAULT_CATEGORY: &str = "general";

/// Reserved sections where the profiler records its own cost.
///
/// These live in a separate keyspace from application sections, so an
/// application section that happens to be called `"profiler.record"` gets
/// its own buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InternalSection {
    /// Cost of appending one section sample
    Record,
    /// Cost of appending one frame sample
    Frame,
    /// Cost of the recording step that follows a measured closure
    Measure,
    /// Cost of computing a snapshot
    Snapshot,
}

impl InternalSection {
    /// Every reserved section.
    pub const ALL: [InternalSection; 4] = [
        InternalSection::Record,
        InternalSection::Frame,
        InternalSection::Measure,
        InternalSection::Snapshot,
    ];

    /// Display name used in snapshots.
    pub fn name(self) -> &'static str {
        match self {
            InternalSection::Record => "profiler.record",
            InternalSection::Frame => "profiler.frame",
            InternalSection::Measure => "profiler.measure",
            InternalSection::Snapshot => "profiler.snapshot",
        }
    }
}

/// One named stream of durations.
#[derive(Debug, Clone)]
pub struct Section {
    category: String,
    buffer: RingBuffer,
}

impl Section {
    fn new(category: &str, capacity: usize) -> Self {
        Self {
            category: category.to_string(),
            buffer: RingBuffer::new(capacity),
        }
    }

    /// Category fixed when the section was first created.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Sample storage.
    pub fn buffer(&self) -> &RingBuffer {
        &self.buffer
    }

    /// Append a sample.
    #[inline]
    pub fn add(&mut self, timestamp: u64, duration_ns: u64) {
        self.buffer.add(timestamp, duration_ns);
    }
}

/// Borrowed view of a registered section, yielded by [`SectionRegistry::iter`].
#[derive(Debug, Clone, Copy)]
pub struct SectionEntry<'a> {
    /// Display name
    pub name: &'a str,
    /// Whether this is one of the profiler's own sections
    pub internal: bool,
    /// The section itself
    pub section: &'a Section,
}

/// Map from section name to section, plus the reserved internal sections.
///
/// Not synchronized on its own; the profiler keeps it behind its state lock.
#[derive(Debug, Clone)]
pub struct SectionRegistry {
    user: HashMap<String, Section>,
    internal: HashMap<InternalSection, Section>,
    capacity: usize,
}

impl SectionRegistry {
    /// Create an empty registry whose sections each hold `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            user: HashMap::new(),
            internal: HashMap::new(),
            capacity,
        }
    }

    /// Append a sample to an application section, creating it with
    /// `category` if absent.
    ///
    /// The first caller to create a section decides its category; later
    /// categories are ignored. The name is only copied when a new section
    /// is inserted.
    pub fn append(&mut self, name: &str, category: &str, timestamp: u64, duration_ns: u64) {
        if let Some(section) = self.user.get_mut(name) {
            section.add(timestamp, duration_ns);
            return;
        }

        let mut section = Section::new(category, self.capacity);
        section.add(timestamp, duration_ns);
        self.user.insert(name.to_string(), section);
    }

    /// Look up a reserved section, creating it if absent.
    pub fn internal(&mut self, id: InternalSection) -> &mut Section {
        let capacity = self.capacity;
        self.internal
            .entry(id)
            .or_insert_with(|| Section::new(PROFILER_CATEGORY, capacity))
    }

    /// Look up an application section without creating it.
    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&Section> {
        self.user.get(name)
    }

    /// Iterate over every registered section, application and internal.
    pub fn iter(&self) -> impl Iterator<Item = SectionEntry<'_>> {
        let user = self.user.iter().map(|(name, section)| SectionEntry {
            name: name.as_str(),
            internal: false,
            section,
        });
        let internal = self.internal.iter().map(|(id, section)| SectionEntry {
            name: id.name(),
            internal: true,
            section,
        });
        user.chain(internal)
    }

    /// Empty every section's buffer. Sections stay registered with their categories.
    pub fn clear(&mut self) {
        for section in self.user.values_mut().chain(self.internal.values_mut()) {
            section.buffer.clear();
        }
    }

    /// Number of registered sections, internal ones included.
    pub fn len(&self) -> usize {
        self.user.len() + self.internal.len()
    }

    /// Whether no section has been registered.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_first_category_wins() {
        let mut registry = SectionRegistry::new(4);
        registry.append("draw", "render", 1, 10);
        registry.append("draw", "layout", 2, 20);

        let section = registry.get("draw").unwrap();
        assert_eq!(section.category(), "render");
        assert_eq!(section.buffer().len(), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_internal_sections_do_not_collide() {
        let mut registry = SectionRegistry::new(4);
        registry.append("profiler.record", "app", 1, 1);
        registry.internal(InternalSection::Record).add(1, 2);

        assert_eq!(registry.len(), 2);
        let entries: Vec<_> = registry
            .iter()
            .filter(|e| e.name == "profiler.record")
            .collect();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| e.internal && e.section.category() == PROFILER_CATEGORY));
        assert!(entries.iter().any(|e| !e.internal && e.section.category() == "app"));
    }

    #[test]
    fn test_internal_names_are_distinct() {
        let mut names: Vec<_> = InternalSection::ALL.iter().map(|s| s.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), InternalSection::ALL.len());
    }

    #[test]
    fn test_clear_keeps_sections() {
        let mut registry = SectionRegistry::new(4);
        registry.append("draw", "render", 1, 10);
        registry.internal(InternalSection::Frame).add(1, 5);
        registry.clear();

        assert_eq!(registry.len(), 2);
        assert!(registry.iter().all(|e| e.section.buffer().is_empty()));
        assert_eq!(registry.get("draw").unwrap().category(), "render");
    }
}
