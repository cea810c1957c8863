use crate::errors::ToolError;
use crate::services::logger::Logger;
use serde::Deserialize;
use std::future::Future;

/// One page of a skip/limit listing as returned upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub rows: Vec<T>,
    #[serde(default)]
    pub total: usize,
}

/// Calls `fetch_page(skip, limit)` until the accumulated row count reaches the
/// server-reported `total`, returning rows in arrival order.
///
/// A failing page aborts the whole listing. An empty page before `total` is
/// reached also ends the listing, with a warning, rather than spinning.
pub async fn fetch_all_pages<T, F, Fut>(
    logger: &Logger,
    label: &str,
    limit: usize,
    mut fetch_page: F,
) -> Result<Vec<T>, ToolError>
where
    F: FnMut(usize, usize) -> Fut,
    Fut: Future<Output = Result<Page<T>, ToolError>>,
{
    let limit = limit.max(1);
    let mut rows: Vec<T> = Vec::new();
    loop {
        let page = fetch_page(rows.len(), limit).await?;
        let total = page.total;
        let received = page.rows.len();
        rows.extend(page.rows);
        if rows.len() >= total {
            break;
        }
        if received == 0 {
            logger.warn(
                "Upstream returned an empty page before reaching its reported total",
                Some(&serde_json::json!({
                    "listing": label,
                    "collected": rows.len(),
                    "total": total,
                })),
            );
            break;
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn pages_of(total: usize) -> impl FnMut(usize, usize) -> std::future::Ready<Result<Page<usize>, ToolError>> {
        move |skip, limit| {
            let end = (skip + limit).min(total);
            std::future::ready(Ok(Page {
                rows: (skip..end).collect(),
                total,
            }))
        }
    }

    #[tokio::test]
    async fn collects_every_row_in_order() {
        let logger = Logger::new("test");
        let rows = fetch_all_pages(&logger, "numbers", 100, pages_of(250))
            .await
            .unwrap();
        assert_eq!(rows.len(), 250);
        assert!(rows.iter().enumerate().all(|(i, v)| i == *v));
    }

    #[tokio::test]
    async fn requests_advance_skip_by_received_rows() {
        let logger = Logger::new("test");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let mut inner = pages_of(250);
        fetch_all_pages(&logger, "numbers", 100, move |skip, limit| {
            log.lock().unwrap().push((skip, limit));
            inner(skip, limit)
        })
        .await
        .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![(0, 100), (100, 100), (200, 100)]);
    }

    #[tokio::test]
    async fn zero_total_makes_a_single_request() {
        let logger = Logger::new("test");
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let rows: Vec<usize> = fetch_all_pages(&logger, "empty", 100, move |_, _| {
            *counter.lock().unwrap() += 1;
            std::future::ready(Ok(Page {
                rows: Vec::new(),
                total: 0,
            }))
        })
        .await
        .unwrap();
        assert!(rows.is_empty());
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn failing_page_discards_partial_results() {
        let logger = Logger::new("test");
        let result: Result<Vec<usize>, ToolError> =
            fetch_all_pages(&logger, "flaky", 100, |skip, _| {
                std::future::ready(if skip == 0 {
                    Ok(Page {
                        rows: (0..100).collect(),
                        total: 250,
                    })
                } else {
                    Err(ToolError::upstream(Some(503), "page failed"))
                })
            })
            .await;
        assert_eq!(result.unwrap_err().status(), Some(503));
    }

    #[tokio::test]
    async fn empty_page_before_total_stops_the_listing() {
        let logger = Logger::new("test");
        let rows: Vec<usize> = fetch_all_pages(&logger, "short", 100, |skip, _| {
            std::future::ready(Ok(Page {
                rows: if skip == 0 { (0..10).collect() } else { Vec::new() },
                total: 500,
            }))
        })
        .await
        .unwrap();
        assert_eq!(rows.len(), 10);
    }
}
