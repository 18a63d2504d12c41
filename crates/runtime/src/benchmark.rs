pub fn calculate_cells_per_sec(path_cells: u64, elapsed_micros: u64) -> u64 {
    if elapsed_micros == 0 {
        return 0;
    }

    let scaled_cells = (path_cells as u128).saturating_mul(1_000_000);
    let achieved = scaled_cells / elapsed_micros as u128;
    u64::try_from(achieved).unwrap_or(u64::MAX)
}
