use crate::error::Result;
use ispstore::sync::Pull;
use std::future::Future;

/// Drives a `(limit, offset)` loop against a bulk-listing endpoint until a
/// short or empty page signals the natural end.
///
/// A failure on the first page propagates; a failure mid-stream returns the
/// records accumulated so far with the stop reason attached, because partial
/// results beat none for a nightly batch job. Progress is logged per page so
/// an operator can tell a stalled fetch from a slow one.
pub async fn fetch_all_pages<T, F, Fut>(
    label: &str,
    page_size: usize,
    mut fetch_page: F,
) -> Result<Pull<T>>
where
    F: FnMut(usize, usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut records: Vec<T> = Vec::new();
    loop {
        let offset = records.len();
        let page = match fetch_page(page_size, offset).await {
            Ok(page) => page,
            Err(err) if offset == 0 => return Err(err),
            Err(err) => {
                log::warn!("{label}: stopped after {offset} records: {err}");
                return Ok(Pull::truncated(records, err.to_string()));
            }
        };
        let page_len = page.len();
        records.extend(page);
        log::info!("{label}: {} records so far", records.len());
        if page_len < page_size {
            return Ok(Pull::complete(records));
        }
    }
}
