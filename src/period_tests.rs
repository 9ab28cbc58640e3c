// src/period_tests.rs

#[cfg(test)]
mod tests {
    use crate::period::*;
    use chrono::{NaiveDate, Weekday};

    fn d(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .unwrap_or_else(|_| panic!("Invalid date string format: {}", date_str))
    }

    fn r(first: &str, last: &str) -> DateRange {
        DateRange::new(d(first), d(last))
    }

    fn partition(range: DateRange, frequency: Frequency) -> Vec<DateRange> {
        columns(range, frequency, Weekday::Mon).collect()
    }

    /// Every mode must tile the range exactly: ascending, contiguous, no
    /// gaps, no overlaps, endpoints matching the overall range.
    fn assert_tiles(range: DateRange, cols: &[DateRange]) {
        assert!(!cols.is_empty());
        assert_eq!(cols[0].first, range.first);
        assert_eq!(cols[cols.len() - 1].last, range.last);
        for pair in cols.windows(2) {
            assert_eq!(
                pair[0].last.succ_opt().unwrap(),
                pair[1].first,
                "columns {:?} and {:?} are not contiguous",
                pair[0],
                pair[1]
            );
        }
        for col in cols {
            assert!(col.first <= col.last);
        }
    }

    #[test]
    fn totals_only_yields_one_column_equal_to_the_range() {
        let range = r("2020-01-01", "2020-01-31");
        let cols = partition(range, Frequency::TotalsOnly);
        assert_eq!(cols, vec![range]);
    }

    #[test]
    fn daily_yields_one_column_per_day_ascending() {
        let range = r("2020-02-27", "2020-03-02");
        let cols = partition(range, Frequency::Daily);
        assert_eq!(cols.len(), 5); // leap year: 29-Feb exists
        assert_eq!(cols[2], DateRange::single_day(d("2020-02-29")));
        assert_tiles(range, &cols);
        for col in &cols {
            assert_eq!(col.first, col.last);
        }
    }

    #[test]
    fn weekly_partition_of_january_2020_has_five_columns() {
        // 1-Jan-2020 is a Wednesday; Monday-start weeks give partial first
        // and last columns.
        let range = r("2020-01-01", "2020-01-31");
        let cols = partition(range, Frequency::Week);
        assert_eq!(
            cols,
            vec![
                r("2020-01-01", "2020-01-05"),
                r("2020-01-06", "2020-01-12"),
                r("2020-01-13", "2020-01-19"),
                r("2020-01-20", "2020-01-26"),
                r("2020-01-27", "2020-01-31"),
            ]
        );
        assert_tiles(range, &cols);
    }

    #[test]
    fn weekly_partition_honours_a_sunday_week_start() {
        let range = r("2020-01-01", "2020-01-14");
        let cols: Vec<DateRange> = columns(range, Frequency::Week, Weekday::Sun).collect();
        assert_eq!(
            cols,
            vec![
                r("2020-01-01", "2020-01-04"),
                r("2020-01-05", "2020-01-11"),
                r("2020-01-12", "2020-01-14"),
            ]
        );
    }

    #[test]
    fn monthly_partition_crosses_the_year_boundary() {
        let range = r("2019-11-15", "2020-02-10");
        let cols = partition(range, Frequency::Month);
        assert_eq!(
            cols,
            vec![
                r("2019-11-15", "2019-11-30"),
                r("2019-12-01", "2019-12-31"),
                r("2020-01-01", "2020-01-31"),
                r("2020-02-01", "2020-02-10"),
            ]
        );
        assert_tiles(range, &cols);
    }

    #[test]
    fn quarterly_partition_uses_three_month_blocks() {
        let range = r("2020-02-10", "2020-08-01");
        let cols = partition(range, Frequency::Quarter);
        assert_eq!(
            cols,
            vec![
                r("2020-02-10", "2020-03-31"),
                r("2020-04-01", "2020-06-30"),
                r("2020-07-01", "2020-08-01"),
            ]
        );
    }

    #[test]
    fn calendar_year_partition_ends_each_december() {
        let range = r("2019-06-01", "2021-01-15");
        let cols = partition(range, Frequency::CalendarYear);
        assert_eq!(
            cols,
            vec![
                r("2019-06-01", "2019-12-31"),
                r("2020-01-01", "2020-12-31"),
                r("2021-01-01", "2021-01-15"),
            ]
        );
    }

    #[test]
    fn tax_year_boundary_is_the_sixth_of_april() {
        let range = r("2008-01-01", "2008-12-31");
        let cols = partition(range, Frequency::TaxYear);
        assert_eq!(
            cols,
            vec![r("2008-01-01", "2008-04-05"), r("2008-04-06", "2008-12-31")]
        );
        assert_tiles(range, &cols);

        // A full tax year stays one column.
        let full = r("2007-04-06", "2008-04-05");
        assert_eq!(partition(full, Frequency::TaxYear), vec![full]);
    }

    #[test]
    fn partial_detection_compares_against_period_boundaries() {
        // Partial against the week the column sits in.
        assert!(is_partial_column(
            r("2020-01-01", "2020-01-05"),
            Frequency::Week,
            Weekday::Mon
        ));
        assert!(!is_partial_column(
            r("2020-01-06", "2020-01-12"),
            Frequency::Week,
            Weekday::Mon
        ));

        // A user-supplied range that happens to align with quarter
        // boundaries produces no partial columns.
        let range = r("2020-01-01", "2020-12-31");
        for col in partition(range, Frequency::Quarter) {
            assert!(!is_partial_column(col, Frequency::Quarter, Weekday::Mon));
        }

        // Daily and totals-only columns are never partial.
        assert!(!is_partial_column(
            r("2020-01-01", "2020-01-01"),
            Frequency::Daily,
            Weekday::Mon
        ));
        assert!(!is_partial_column(
            r("2020-01-01", "2020-03-04"),
            Frequency::TotalsOnly,
            Weekday::Mon
        ));
    }

    #[test]
    fn headings_cover_all_seven_modes() {
        assert_eq!(
            column_heading(Frequency::TotalsOnly, r("2020-01-01", "2020-01-31")),
            "01-Jan-2020 - 31-Jan-2020"
        );
        assert_eq!(
            column_heading(Frequency::TaxYear, r("2007-04-06", "2008-04-05")),
            "2007 / 2008"
        );
        // A partial first tax-year column still labels the tax year it
        // falls in.
        assert_eq!(
            column_heading(Frequency::TaxYear, r("2008-01-01", "2008-04-05")),
            "2007 / 2008"
        );
        assert_eq!(
            column_heading(Frequency::CalendarYear, r("2008-01-01", "2008-12-31")),
            "2008"
        );
        assert_eq!(
            column_heading(Frequency::Quarter, r("2008-04-01", "2008-06-30")),
            "Q2 2008"
        );
        assert_eq!(
            column_heading(Frequency::Month, r("2008-04-01", "2008-04-30")),
            "Apr 2008"
        );
        assert_eq!(
            column_heading(Frequency::Week, r("2008-04-07", "2008-04-13")),
            "07-Apr-2008 (15)"
        );
        assert_eq!(
            column_heading(Frequency::Daily, r("2008-04-06", "2008-04-06")),
            "06-Apr-2008"
        );
    }

    #[test]
    fn clamp_keeps_the_trailing_days() {
        let range = r("2020-01-01", "2020-02-29");
        let clamped = range.clamp_to_last_days(MAX_DAILY_SPAN_DAYS);
        assert_eq!(clamped.day_count(), MAX_DAILY_SPAN_DAYS);
        assert_eq!(clamped.last, d("2020-02-29"));
        assert_eq!(clamped.first, d("2020-01-29"));

        // Already short enough: untouched.
        let short = r("2020-01-01", "2020-01-10");
        assert_eq!(short.clamp_to_last_days(MAX_DAILY_SPAN_DAYS), short);
    }

    #[test]
    fn partition_is_restartable_per_call() {
        let range = r("2020-01-01", "2020-03-31");
        let first: Vec<DateRange> = columns(range, Frequency::Month, Weekday::Mon).collect();
        let second: Vec<DateRange> = columns(range, Frequency::Month, Weekday::Mon).collect();
        assert_eq!(first, second);
    }
}
