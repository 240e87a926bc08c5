//! External-memory sorted stream (black-box primitive referenced throughout
//! the pipeline): a thin `extsort` wrapper that spills to a temp directory
//! once an in-memory segment budget is exceeded, merging runs back into one
//! ascending iterator.

use std::io::{Read, Write};
use std::path::PathBuf;

use extsort::{ExternalSorter, Sortable};

use crate::scanner::SuperKmerRecord;

/// A [`SuperKmerRecord`] ordered by `minimizer` ascending, the order the
/// classifier (C4) requires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ByMinimizer(pub SuperKmerRecord);

impl Sortable for ByMinimizer {
    fn encode<W: Write>(&self, writer: &mut W) {
        writer.write_all(&self.0.minimizer.to_le_bytes()).unwrap();
        writer.write_all(&self.0.id.to_le_bytes()).unwrap();
        writer.write_all(&self.0.p1.to_le_bytes()).unwrap();
        writer.write_all(&self.0.size.to_le_bytes()).unwrap();
    }

    fn decode<R: Read>(reader: &mut R) -> Option<Self> {
        let mut minimizer_buf = [0u8; 8];
        reader.read_exact(&mut minimizer_buf).ok()?;
        let mut id_buf = [0u8; 8];
        reader.read_exact(&mut id_buf).ok()?;
        let mut p1_buf = [0u8; 4];
        reader.read_exact(&mut p1_buf).ok()?;
        let mut size_buf = [0u8; 4];
        reader.read_exact(&mut size_buf).ok()?;
        Some(ByMinimizer(SuperKmerRecord {
            minimizer: u64::from_le_bytes(minimizer_buf),
            id: u64::from_le_bytes(id_buf),
            p1: u32::from_le_bytes(p1_buf),
            size: u32::from_le_bytes(size_buf),
        }))
    }
}

impl PartialOrd for SuperKmerRecord {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SuperKmerRecord {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.minimizer.cmp(&other.minimizer)
    }
}

/// A bare `u64` (a minimizer-instance id), sortable ascending.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortableId(pub u64);

impl Sortable for SortableId {
    fn encode<W: Write>(&self, writer: &mut W) {
        writer.write_all(&self.0.to_le_bytes()).unwrap();
    }

    fn decode<R: Read>(reader: &mut R) -> Option<Self> {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf).ok()?;
        Some(SortableId(u64::from_le_bytes(buf)))
    }
}

/// Sorts `items` (spilling to `sort_dir` once `segment_size` items have
/// accumulated in memory), returning an ascending iterator over the merged
/// runs.
pub fn sort_external<T, I>(
    items: I,
    segment_size: usize,
    sort_dir: Option<PathBuf>,
) -> std::io::Result<impl Iterator<Item = T>>
where
    T: Sortable + Ord + 'static,
    I: IntoIterator<Item = T>,
{
    let span = tracing::debug_span!("sort_external", segment_size);
    let _enter = span.enter();

    let mut sorter = ExternalSorter::new().with_segment_size(segment_size);
    if let Some(dir) = sort_dir {
        sorter = sorter.with_sort_dir(dir);
    }
    Ok(sorter.sort(items.into_iter())?)
}
