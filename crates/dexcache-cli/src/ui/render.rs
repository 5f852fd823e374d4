use dexcache_core::cache::StoreStats;
use dexcache_core::utils::{display_name, format_height, format_weight, truncate_string};
use dexcache_core::{DetailRecord, LoadState, SummaryRecord, WarmReport};

/// Width of the name column in the list view.
const NAME_COLUMN_WIDTH: usize = 24;

const LOADING: &str = "Loading...";

/// List view: one `id  name` row per summary.
pub fn render_list(state: &LoadState<Vec<SummaryRecord>>) -> String {
    match state {
        LoadState::Pending => LOADING.to_string(),
        LoadState::Failed(e) => e.to_string(),
        LoadState::Resolved(records) if records.is_empty() => "No Pokémon found".to_string(),
        LoadState::Resolved(records) => {
            let mut out = String::from("Pokémon Viewer\n");
            for record in records {
                out.push_str(&format!(
                    "{:>4}  {}\n",
                    record.id,
                    truncate_string(&display_name(&record.name), NAME_COLUMN_WIDTH)
                ));
            }
            out
        }
    }
}

/// Detail view for a single Pokémon.
pub fn render_detail(state: &LoadState<DetailRecord>) -> String {
    match state {
        LoadState::Pending => LOADING.to_string(),
        LoadState::Failed(e) => e.to_string(),
        LoadState::Resolved(record) => {
            let image = if record.has_image() {
                record.image_ref.as_str()
            } else {
                "(no image)"
            };
            format!(
                "#{} {}\nImage:  {}\nHeight: {}\nWeight: {}\n",
                record.id,
                display_name(&record.name),
                image,
                format_height(record.height),
                format_weight(record.weight),
            )
        }
    }
}

pub fn render_status(stats: &StoreStats) -> String {
    format!(
        "{:<8} {:>6}  {}\n{:<8} {:>6}  {}\n",
        "summary",
        stats.summary.records,
        stats.summary.age_display(),
        "detail",
        stats.detail.records,
        stats.detail.age_display(),
    )
}

pub fn render_warm(report: &WarmReport) -> String {
    if report.failed.is_empty() {
        format!("Cached details for {} Pokémon\n", report.loaded.len())
    } else {
        let failed: Vec<String> = report.failed.iter().map(|id| id.to_string()).collect();
        format!(
            "Cached details for {} Pokémon, failed: {}\n",
            report.loaded.len(),
            failed.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dexcache_core::cache::PartitionStats;
    use dexcache_core::LoadError;

    #[test]
    fn test_render_list() {
        let state = LoadState::Resolved(vec![
            SummaryRecord { id: 1, name: "bulbasaur".into(), source_ref: "u1".into() },
            SummaryRecord { id: 122, name: "mr-mime".into(), source_ref: "u122".into() },
        ]);
        assert_eq!(render_list(&state), "Pokémon Viewer\n   1  Bulbasaur\n 122  Mr Mime\n");
        assert_eq!(render_list(&LoadState::Resolved(vec![])), "No Pokémon found");
    }

    #[test]
    fn test_render_pending_and_failed() {
        assert_eq!(render_list(&LoadState::Pending), "Loading...");
        assert_eq!(
            render_list(&LoadState::Failed(LoadError::Collection)),
            "Failed to load Pokémon data"
        );
        assert_eq!(
            render_detail(&LoadState::Failed(LoadError::Detail { id: 9 })),
            "Failed to load Pokémon details"
        );
    }

    #[test]
    fn test_render_detail() {
        let state = LoadState::Resolved(DetailRecord {
            id: 1,
            name: "bulbasaur".into(),
            height: 7,
            weight: 69,
            image_ref: String::new(),
        });
        assert_eq!(
            render_detail(&state),
            "#1 Bulbasaur\nImage:  (no image)\nHeight: 0.7 m\nWeight: 6.9 kg\n"
        );
    }

    #[test]
    fn test_render_status_and_warm() {
        let stats = StoreStats {
            summary: PartitionStats { records: 20, newest: None },
            detail: PartitionStats::default(),
        };
        assert_eq!(render_status(&stats), "summary      20  never\ndetail        0  never\n");

        let report = WarmReport { loaded: vec![1, 2], failed: vec![3, 4] };
        assert_eq!(render_warm(&report), "Cached details for 2 Pokémon, failed: 3, 4\n");
    }
}
