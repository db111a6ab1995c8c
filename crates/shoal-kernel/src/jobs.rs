//! Job table: tracked background and stopped processes.
//!
//! A job is a process group the shell has let go of — backgrounded at launch
//! or suspended from the foreground. Each gets a small integer [`JobId`]
//! distinct from its pid. Ids are minted from a strictly increasing counter
//! and never reused within a session, so `%3` keeps meaning the same job for
//! as long as it lives.
//!
//! The table is an ordered map keyed by job id with a secondary pid index.
//! Every mutation goes through the table API, which maintains the invariant
//! that the two indexes always resolve to the same record.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use nix::unistd::Pid;
use thiserror::Error;

/// Unique identifier for a job. Positive and monotonically assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub u32);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(JobId)
    }
}

/// State of a tracked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Running in the background.
    Running,
    /// Suspended by a stop signal.
    Stopped,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Running => write!(f, "running"),
            JobState::Stopped => write!(f, "suspended"),
        }
    }
}

/// A tracked job. Owned exclusively by the [`JobTable`]; callers mutate
/// records only through table operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub id: JobId,
    /// Process id of the job's process-group leader.
    pub pid: Pid,
    pub state: JobState,
    /// Display label, normally the command path the job was launched with.
    pub command: String,
}

/// Job-table operation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("no such job")]
    NoSuchJob(JobId),
    #[error("no such job")]
    NoSuchPid(Pid),
    #[error("duplicate job id {0}")]
    DuplicateId(JobId),
    #[error("pid {0} already tracked")]
    DuplicatePid(Pid),
}

/// Ordered collection of job records, indexed by job id and by pid.
#[derive(Debug, Default)]
pub struct JobTable {
    /// Records in id order. Ids are monotonic, so iteration order is also
    /// insertion order.
    records: BTreeMap<JobId, JobRecord>,
    /// Secondary index: process-group leader pid to job id.
    by_pid: HashMap<Pid, JobId>,
    /// Next id to assign. Strictly increasing for the life of the session.
    next_id: u32,
}

impl JobTable {
    pub fn new() -> Self {
        JobTable {
            records: BTreeMap::new(),
            by_pid: HashMap::new(),
            next_id: 1,
        }
    }

    /// The id the next inserted job will get. Does not advance the counter;
    /// a successful [`insert`](Self::insert) of this id does.
    pub fn next_id(&self) -> JobId {
        JobId(self.next_id)
    }

    /// Insert a new job. Fails if the id or pid is already tracked; on
    /// success the id counter advances past `id` so the id is never minted
    /// again this session.
    pub fn insert(
        &mut self,
        id: JobId,
        pid: Pid,
        state: JobState,
        command: impl Into<String>,
    ) -> Result<(), JobError> {
        if self.records.contains_key(&id) {
            return Err(JobError::DuplicateId(id));
        }
        if self.by_pid.contains_key(&pid) {
            return Err(JobError::DuplicatePid(pid));
        }

        self.records.insert(
            id,
            JobRecord {
                id,
                pid,
                state,
                command: command.into(),
            },
        );
        self.by_pid.insert(pid, id);
        if id.0 >= self.next_id {
            self.next_id = id.0 + 1;
        }
        Ok(())
    }

    /// Update the state of the job led by `pid`.
    pub fn update_state(&mut self, pid: Pid, state: JobState) -> Result<(), JobError> {
        let id = self.by_pid.get(&pid).ok_or(JobError::NoSuchPid(pid))?;
        // The pid index points at a live record by construction.
        let record = self
            .records
            .get_mut(id)
            .ok_or(JobError::NoSuchJob(*id))?;
        record.state = state;
        Ok(())
    }

    /// Remove the job led by `pid`, returning its record.
    pub fn remove_by_pid(&mut self, pid: Pid) -> Result<JobRecord, JobError> {
        let id = self.by_pid.remove(&pid).ok_or(JobError::NoSuchPid(pid))?;
        self.records.remove(&id).ok_or(JobError::NoSuchJob(id))
    }

    /// Remove the job with the given id, returning its record.
    pub fn remove_by_id(&mut self, id: JobId) -> Result<JobRecord, JobError> {
        let record = self.records.remove(&id).ok_or(JobError::NoSuchJob(id))?;
        self.by_pid.remove(&record.pid);
        Ok(record)
    }

    /// Pid of the job with the given id, if tracked.
    pub fn lookup_pid(&self, id: JobId) -> Option<Pid> {
        self.records.get(&id).map(|r| r.pid)
    }

    /// State of the job led by `pid`, if tracked.
    pub fn lookup_state(&self, pid: Pid) -> Option<JobState> {
        self.by_pid
            .get(&pid)
            .and_then(|id| self.records.get(id))
            .map(|r| r.state)
    }

    /// Job id for a pid, if tracked.
    pub fn job_for_pid(&self, pid: Pid) -> Option<JobId> {
        self.by_pid.get(&pid).copied()
    }

    /// All records in job-id order (for the `jobs` listing).
    pub fn list(&self) -> impl Iterator<Item = &JobRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record. The id counter keeps its value so ids stay unique
    /// even across a `clear`.
    pub fn clear(&mut self) {
        self.records.clear();
        self.by_pid.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(n: i32) -> Pid {
        Pid::from_raw(n)
    }

    #[test]
    fn insert_and_lookup_both_directions() {
        let mut table = JobTable::new();
        let id = table.next_id();
        table.insert(id, pid(100), JobState::Running, "/bin/sleep").unwrap();

        assert_eq!(table.lookup_pid(id), Some(pid(100)));
        assert_eq!(table.job_for_pid(pid(100)), Some(id));
        assert_eq!(table.lookup_state(pid(100)), Some(JobState::Running));
    }

    #[test]
    fn bidirectional_consistency_after_mutations() {
        let mut table = JobTable::new();
        for n in 1..=5 {
            let id = table.next_id();
            table
                .insert(id, pid(100 + n), JobState::Running, "cmd")
                .unwrap();
        }
        table.remove_by_pid(pid(102)).unwrap();
        table.remove_by_id(JobId(4)).unwrap();
        table.update_state(pid(105), JobState::Stopped).unwrap();

        for record in table.list() {
            assert_eq!(table.lookup_pid(record.id), Some(record.pid));
            assert_eq!(table.job_for_pid(record.pid), Some(record.id));
        }
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let mut table = JobTable::new();
        let first = table.next_id();
        table.insert(first, pid(10), JobState::Running, "a").unwrap();
        let second = table.next_id();
        table.insert(second, pid(11), JobState::Running, "b").unwrap();
        assert!(second > first);

        // Freeing the most recent job must not free its id.
        table.remove_by_id(second).unwrap();
        let third = table.next_id();
        assert!(third > second);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut table = JobTable::new();
        let id = table.next_id();
        table.insert(id, pid(10), JobState::Running, "a").unwrap();

        assert_eq!(
            table.insert(id, pid(11), JobState::Running, "b"),
            Err(JobError::DuplicateId(id))
        );
        assert_eq!(
            table.insert(JobId(99), pid(10), JobState::Running, "c"),
            Err(JobError::DuplicatePid(pid(10)))
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn removal_of_unknown_job_is_an_error_not_a_panic() {
        let mut table = JobTable::new();
        assert_eq!(
            table.remove_by_id(JobId(7)),
            Err(JobError::NoSuchJob(JobId(7)))
        );
        assert_eq!(
            table.remove_by_pid(pid(7)),
            Err(JobError::NoSuchPid(pid(7)))
        );
        assert_eq!(
            table.update_state(pid(7), JobState::Stopped),
            Err(JobError::NoSuchPid(pid(7)))
        );
    }

    #[test]
    fn list_is_in_id_order() {
        let mut table = JobTable::new();
        for n in 0..4 {
            let id = table.next_id();
            table.insert(id, pid(50 + n), JobState::Running, "x").unwrap();
        }
        let ids: Vec<u32> = table.list().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn clear_keeps_the_id_counter() {
        let mut table = JobTable::new();
        let id = table.next_id();
        table.insert(id, pid(10), JobState::Running, "a").unwrap();
        table.clear();
        assert!(table.is_empty());
        assert!(table.next_id() > id);
    }
}
