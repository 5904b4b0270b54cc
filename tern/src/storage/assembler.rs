use core::fmt;

/// A contiguous chunk of absent data, followed by a contiguous chunk of present data.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contig {
    hole_size: u64,
    data_size: u64,
}

/// Tracks which parts of a window of octets are present.
///
/// Offsets are relative to the start of the window. The window is described as a sequence of
/// contigs, each a hole followed by data. Only the first contig may have an empty hole and no
/// contig has empty data, so the representation of any set of ranges is unique.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assembler {
    contigs: Vec<Contig>,
}

/// Iterator over the present ranges of an `Assembler`, as `(start, end)` pairs.
pub struct AssemblerIter<'a> {
    contigs: core::slice::Iter<'a, Contig>,
    offset: u64,
}

impl Contig {
    /// A contig with a hole of the given size followed by data of the given size.
    pub fn hole_and_data(hole_size: u64, data_size: u64) -> Contig {
        Contig { hole_size, data_size }
    }

    fn has_hole(&self) -> bool {
        self.hole_size != 0
    }

    fn has_data(&self) -> bool {
        self.data_size != 0
    }

    fn total_size(&self) -> u64 {
        self.hole_size + self.data_size
    }
}

impl fmt::Display for Contig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.has_hole() { write!(f, "({})", self.hole_size)?; }
        if self.has_hole() && self.has_data() { write!(f, " ")?; }
        if self.has_data() { write!(f, "{}",   self.data_size)?; }
        Ok(())
    }
}

impl fmt::Display for Assembler {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[ ")?;
        for contig in self.contigs.iter() {
            write!(f, "{} ", contig)?;
        }
        write!(f, "]")?;
        Ok(())
    }
}

impl Assembler {
    /// Create an assembler where nothing is present.
    pub fn new() -> Self {
        Assembler::default()
    }

    /// Return whether the assembler contains no data.
    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    /// The number of present octets.
    pub fn data_len(&self) -> u64 {
        self.contigs.iter().map(|contig| contig.data_size).sum()
    }

    /// The number of present octets at the very start of the window.
    pub fn front_len(&self) -> u64 {
        match self.contigs.first() {
            Some(contig) if !contig.has_hole() => contig.data_size,
            _ => 0,
        }
    }

    /// Mark the range `start..start + size` as present.
    ///
    /// ## Example
    ///
    /// ```
    /// # use tern::storage::Assembler;
    /// let mut asm = Assembler::new();
    ///
    /// // Add four bytes not at the start.
    /// asm.add(4, 4);
    /// assert_eq!(asm.front_len(), 0);
    /// // Add missing four bytes at the start, which assembles the chunk.
    /// asm.add(0, 4);
    /// assert_eq!(asm.front_len(), 8);
    /// ```
    pub fn add(&mut self, start: u64, size: u64) {
        if size == 0 {
            return;
        }

        let mut ranges: Vec<(u64, u64)> = self.iter_data().collect();
        ranges.push((start, start + size));
        ranges.sort_unstable();

        self.contigs.clear();
        let mut end_of_last = 0;
        let mut current: Option<(u64, u64)> = None;
        for (left, right) in ranges {
            current = match current {
                // Overlapping or adjacent ranges merge.
                Some((cur_left, cur_right)) if left <= cur_right => {
                    Some((cur_left, cur_right.max(right)))
                },
                Some((cur_left, cur_right)) => {
                    self.contigs.push(Contig::hole_and_data(
                        cur_left - end_of_last,
                        cur_right - cur_left));
                    end_of_last = cur_right;
                    Some((left, right))
                },
                None => Some((left, right)),
            };
        }

        if let Some((cur_left, cur_right)) = current {
            self.contigs.push(Contig::hole_and_data(
                cur_left - end_of_last,
                cur_right - cur_left));
        }
    }

    /// Remove up to `max` present octets from the start of the window, moving the window forward.
    ///
    /// Returns the number of octets removed, which is zero if the window starts with a hole.
    ///
    /// ## Example
    ///
    /// ```
    /// # use tern::storage::Assembler;
    /// let mut asm = Assembler::new();
    ///
    /// asm.add(0, 4);
    /// asm.add(6, 2);
    /// assert_eq!(asm.reduce_front(3), 3);
    /// assert_eq!(asm.reduce_front(3), 1);
    /// // The next range now starts two octets into the window.
    /// assert_eq!(asm.iter_data().collect::<Vec<_>>(), vec![(2, 4)]);
    /// ```
    pub fn reduce_front(&mut self, max: u64) -> u64 {
        let front = match self.contigs.first_mut() {
            Some(contig) if !contig.has_hole() => contig,
            _ => return 0,
        };

        if front.data_size > max {
            front.data_size -= max;
            return max;
        }

        let removed = front.data_size;
        self.contigs.remove(0);
        removed
    }

    /// Iterate over all of the contiguous data ranges.
    ///
    /// ```text
    ///    Hole        Data        Hole        Data
    /// |--- 100 ---|--- 100 ---|--- 100 ---|--- 100 ---|
    ///
    /// ```
    ///
    /// This would return the ranges: ``(100, 200), (300, 400)``
    pub fn iter_data(&self) -> AssemblerIter<'_> {
        AssemblerIter {
            contigs: self.contigs.iter(),
            offset: 0,
        }
    }
}

impl<'a> Iterator for AssemblerIter<'a> {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<(u64, u64)> {
        let contig = self.contigs.next()?;
        let left = self.offset + contig.hole_size;
        self.offset += contig.total_size();
        Some((left, self.offset))
    }
}
