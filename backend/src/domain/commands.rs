//! Domain-level command and query types.
//!
//! These structs are used by services inside the domain layer and are not a
//! public wire surface. Frontends map their own DTOs onto these before
//! calling in.

pub mod statistics {
    /// Query for one month's derived statistics.
    #[derive(Debug, Clone)]
    pub struct MonthlyStatsQuery {
        pub user_id: String,
        pub year: i32,
        pub month: u32,
    }

    /// Query for a trailing window of monthly statistics (dashboard trend
    /// charts). `months_back` includes the anchor month itself.
    #[derive(Debug, Clone)]
    pub struct MonthlySeriesQuery {
        pub user_id: String,
        pub year: i32,
        pub month: u32,
        pub months_back: u32,
    }
}

pub mod registration {
    /// Input for opening a registration workflow.
    #[derive(Debug, Clone)]
    pub struct BeginRegistrationCommand {
        pub user_id: String,
    }

    /// Result of a fully committed reconciliation batch.
    #[derive(Debug, Clone)]
    pub struct SubmitRecordsResult {
        pub records_committed: usize,
        pub new_balance: f64,
        pub success_message: String,
    }
}
