//! Progress events emitted by the crawl and extract stages.
//!
//! Reporting is one-way: a stage hands each event to a [`ProgressSink`] and
//! moves on. Sinks must not block.

use serde::Serialize;

pub trait ProgressSink<E>: Send + Sync {
    fn report(&self, event: E);
}

impl<E, F> ProgressSink<E> for F
where
    F: Fn(E) + Send + Sync,
{
    fn report(&self, event: E) {
        self(event)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum CrawlEvent {
    Discovering {
        current_url: String,
        discovered_so_far: usize,
    },
    Complete {
        total_links: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ExtractEvent {
    Converting {
        url: String,
        current: usize,
        total: usize,
        percent: f64,
    },
    Complete {
        pages: usize,
        percent: f64,
    },
}

impl ExtractEvent {
    /// Event for the `current`-th (1-based) of `total` pages.
    pub fn converting(url: &str, current: usize, total: usize) -> Self {
        ExtractEvent::Converting {
            url: url.to_string(),
            current,
            total,
            percent: percent(current, total),
        }
    }
}

/// `100 * current / total`, rounded to two decimals.
pub fn percent(current: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    let raw = current as f64 * 100.0 / total as f64;
    (raw * 100.0).round() / 100.0
}

/// Events of a whole job, as seen by a front end.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum JobEvent {
    Crawl(CrawlEvent),
    Extract(ExtractEvent),
    Failed { error: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::Mutex;

    #[rstest]
    #[case(1, 3, 33.33)]
    #[case(2, 3, 66.67)]
    #[case(3, 3, 100.0)]
    #[case(1, 8, 12.5)]
    #[case(0, 0, 100.0)]
    fn test_percent(#[case] current: usize, #[case] total: usize, #[case] expected: f64) {
        assert_eq!(percent(current, total), expected);
    }

    #[rstest]
    #[case(
        JobEvent::Crawl(CrawlEvent::Discovering {
            current_url: "http://ex.com/".to_string(),
            discovered_so_far: 1,
        }),
        r#"{"stage":"crawl","phase":"discovering","current_url":"http://ex.com/","discovered_so_far":1}"#
    )]
    #[case(
        JobEvent::Extract(ExtractEvent::Complete { pages: 2, percent: 100.0 }),
        r#"{"stage":"extract","phase":"complete","pages":2,"percent":100.0}"#
    )]
    #[case(
        JobEvent::Failed { error: "boom".to_string() },
        r#"{"stage":"failed","error":"boom"}"#
    )]
    fn test_job_event_json(#[case] event: JobEvent, #[case] expected: &str) {
        assert_eq!(serde_json::to_string(&event).unwrap(), expected);
    }

    #[test]
    fn test_closure_sink() {
        let events = Mutex::new(Vec::new());
        let sink = |event: CrawlEvent| events.lock().unwrap().push(event);

        sink.report(CrawlEvent::Complete { total_links: 3 });

        assert_eq!(
            events.into_inner().unwrap(),
            vec![CrawlEvent::Complete { total_links: 3 }]
        );
    }
}
