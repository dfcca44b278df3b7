// Exports the dashboard-facing types to TypeScript.
// Output directory follows TS_RS_EXPORT_DIR (default ./bindings).
use seller_sync_lib::domain::date_range::DateRange;
use seller_sync_lib::domain::sales::{LogisticBreakdown, LogisticType, SaleOrder, SalesSummary, SalesTotals};
use seller_sync_lib::domain::sync_progress::{SyncPhase, SyncProgress};
use ts_rs::TS;

fn main() {
    let exports: [(&str, fn() -> Result<(), ts_rs::ExportError>); 8] = [
        ("SyncProgress", SyncProgress::export_all),
        ("SyncPhase", SyncPhase::export_all),
        ("DateRange", DateRange::export_all),
        ("LogisticType", LogisticType::export_all),
        ("SaleOrder", SaleOrder::export_all),
        ("SalesTotals", SalesTotals::export_all),
        ("LogisticBreakdown", LogisticBreakdown::export_all),
        ("SalesSummary", SalesSummary::export_all),
    ];

    let mut failed = false;
    for (name, export) in exports {
        match export() {
            Ok(()) => println!("{name}: exported"),
            Err(e) => {
                eprintln!("{name} export error: {e}");
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
    println!("TypeScript bindings generated");
}
