use crate::configuration::Settings;
use crate::fetch::{fetch, FetchContext};
use crate::models::{ComicEntry, ComicRule, FailureRecord, Outcome, RunResult};
use chrono::NaiveDate;
use futures::{stream, StreamExt};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::path::Path;

/// Fetches every configured comic into `dir`.
///
/// A comic that fails becomes an entry carrying its error trace; it never
/// stops the others. Entries come back in configuration order.
pub async fn run(settings: &Settings, date: NaiveDate, dir: &Path) -> RunResult {
    info!("Fetching {} comics for {}", settings.comics.len(), date);
    let ids = assign_ids(&settings.comics);
    let ctx = FetchContext {
        date,
        dir,
        http: &settings.http,
    };

    let comics = stream::iter(settings.comics.iter().zip(ids))
        .map(|(rule, id)| fetch_entry(rule, id, ctx))
        .buffered(settings.http.concurrency())
        .collect::<Vec<_>>()
        .await;

    let failed = comics.iter().filter(|c| c.error_detail().is_some()).count();
    info!("Finished! {} fetched, {} failed", comics.len() - failed, failed);
    RunResult { date, comics }
}

async fn fetch_entry(rule: &ComicRule, id: String, ctx: FetchContext<'_>) -> ComicEntry {
    info!("Checking comic: {}", rule.title);
    let outcome = match fetch(rule, &id, ctx).await {
        Ok(fetched) => Outcome::Fetched(fetched),
        Err(e) => {
            let e = anyhow::Error::new(e);
            error!("Unable to fetch {}: {:#}, skipping", rule.title, e);
            Outcome::Failed(FailureRecord {
                error_detail: format!("{:?}", e),
            })
        }
    };
    ComicEntry {
        id,
        rule: rule.clone(),
        outcome,
    }
}

/// Derived ids, one per rule. Later rules whose id is already taken get a
/// `-2`, `-3`, ... suffix so no two comics write to the same file.
fn assign_ids(rules: &[ComicRule]) -> Vec<String> {
    let mut taken = HashSet::new();
    rules
        .iter()
        .map(|rule| {
            let base = rule.id();
            let mut id = base.clone();
            let mut n = 2;
            while taken.contains(&id) {
                id = format!("{}-{}", base, n);
                n += 1;
            }
            if id != base {
                warn!("\"{}\" collides with an earlier comic id, using {}", rule.title, id);
            }
            debug!("{} -> {}", rule.title, id);
            taken.insert(id.clone());
            id
        })
        .collect()
}
