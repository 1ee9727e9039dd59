/// A contiguous range of alignment rows: `count` rows starting at row `first` (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Job {
    pub first: u64,
    pub count: u64,
}

///
/// Split `total` rows into contiguous jobs of `total / sections + sections` rows each, the
/// last one truncated. Jobs never overlap and cover every row exactly once; there are at most
/// `sections` of them.
pub fn divide_jobs(total: u64, sections: u64) -> Vec<Job> {
    let sections = sections.max(1);
    let per_section = total / sections + sections;

    let mut jobs = Vec::new();
    let mut first = 1;
    let mut remaining = total;
    while remaining > 0 {
        let count = per_section.min(remaining);
        jobs.push(Job { first, count });
        first += count;
        remaining -= count;
    }
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_divide_jobs() {
        assert_eq!(
            divide_jobs(10, 3),
            vec![Job { first: 1, count: 6 }, Job { first: 7, count: 4 }]
        );
    }

    #[rstest]
    #[case(0, 4)]
    #[case(1, 1)]
    #[case(7, 0)]
    #[case(100, 8)]
    #[case(12345, 16)]
    fn test_jobs_cover_every_row_once(#[case] total: u64, #[case] sections: u64) {
        let jobs = divide_jobs(total, sections);

        let mut next = 1;
        for job in &jobs {
            assert_eq!(job.first, next);
            assert!(job.count > 0);
            next += job.count;
        }
        assert_eq!(next - 1, total);
        assert!(jobs.len() as u64 <= sections.max(1));
    }
}
