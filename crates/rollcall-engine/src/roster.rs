use rollcall_core::errors::SessionError;
use rollcall_core::ids::StudentId;
use rollcall_core::model::{MarkSource, Student};

/// Per-student presence for one class session.
///
/// The student list is the authoritative state; the remaining/marked/
/// absentee lists are projections derived from it on demand. Undo history
/// is a strict LIFO stack of mark events — only the single most recent
/// mark can be reverted at a time.
#[derive(Debug)]
pub struct Roster {
    students: Vec<Student>,
    mark_order: Vec<(StudentId, MarkSource)>,
    auto_marked: u32,
}

impl Roster {
    /// Build a roster from the class enrollment. Everyone starts absent
    /// regardless of any presence carried on the input records.
    pub fn new(mut students: Vec<Student>) -> Self {
        for s in &mut students {
            s.present = false;
        }
        Self {
            students,
            mark_order: Vec::new(),
            auto_marked: 0,
        }
    }

    /// Mark a student present. One indivisible operation:
    /// check-absent → set-present → push onto the undo stack.
    /// Returns the new present count.
    pub fn mark_present(&mut self, id: &StudentId, source: MarkSource) -> Result<u32, SessionError> {
        let student = self
            .students
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| SessionError::UnknownStudent(id.clone()))?;
        if student.present {
            return Err(SessionError::AlreadyMarked(id.clone()));
        }
        student.present = true;
        self.mark_order.push((id.clone(), source));
        if source == MarkSource::Auto {
            self.auto_marked += 1;
        }
        Ok(self.present_count())
    }

    /// Revert the single most recent mark. Returns the student unmarked.
    pub fn undo_last(&mut self) -> Result<StudentId, SessionError> {
        let (id, source) = self.mark_order.pop().ok_or(SessionError::NothingToUndo)?;
        if let Some(student) = self.students.iter_mut().find(|s| s.id == id) {
            student.present = false;
        }
        if source == MarkSource::Auto {
            self.auto_marked -= 1;
        }
        Ok(id)
    }

    pub fn present_count(&self) -> u32 {
        self.mark_order.len() as u32
    }

    pub fn remaining_count(&self) -> u32 {
        self.total() - self.present_count()
    }

    pub fn total(&self) -> u32 {
        self.students.len() as u32
    }

    /// Students marked by the auto-mark policy rather than manually.
    pub fn auto_marked_count(&self) -> u32 {
        self.auto_marked
    }

    /// Still-absent students in presentation order (the markable list).
    pub fn remaining(&self) -> Vec<Student> {
        self.students.iter().filter(|s| !s.present).cloned().collect()
    }

    /// Marked students, most recent first (the "recently marked" list).
    pub fn marked(&self) -> Vec<Student> {
        self.mark_order
            .iter()
            .rev()
            .filter_map(|(id, _)| self.students.iter().find(|s| &s.id == id))
            .cloned()
            .collect()
    }

    /// Snapshot of everyone still absent — the list surfaced on stop for
    /// the "mark present after the fact" affordance.
    pub fn absentees(&self) -> Vec<Student> {
        self.remaining()
    }
}
