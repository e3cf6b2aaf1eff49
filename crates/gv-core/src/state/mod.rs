use std::sync::Arc;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::{ColumnRole, StoreField, VisualizationConfig};
use crate::data::DatasetParser;
use crate::dataset::Dataset;
use crate::events::{events, EventBus};
use crate::queries::{self, ColumnSelection, Location};
use crate::StoreError;

/// Everything the store holds
#[derive(Debug)]
struct StoreState {
    /// Last text handed to `update_content`
    pub raw_text: String,

    /// Current dataset, replaced wholesale on every successful parse
    pub dataset: Arc<Dataset>,

    /// Latitude / longitude / multiplier column selection
    pub selection: ColumnSelection,

    /// Field delimiter used for the next parse
    pub delimiter: String,

    /// Heat layer point radius
    pub radius: f64,

    /// Heat layer blur
    pub blur: f64,

    /// Base tile URL template
    pub tile_source_url: String,

    /// Ticket of the most recent content update
    pub content_generation: u64,
}

impl StoreState {
    fn from_config(config: VisualizationConfig) -> Self {
        Self {
            raw_text: String::new(),
            dataset: Arc::new(Dataset::default()),
            selection: config.selection(),
            delimiter: config.delimiter,
            radius: config.radius,
            blur: config.blur,
            tile_source_url: config.tile_source_url,
            content_generation: 0,
        }
    }
}

/// Result of a content update that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The parsed dataset is now current
    Committed { generation: u64, rows: usize, columns: usize },
    /// Newer content was requested while parsing; the result was dropped
    Superseded { generation: u64, latest: u64 },
}

/// Process-wide state store
///
/// Single-field mutations assign and return immediately. Derived queries
/// (`get_columns`, `get_locations`) are recomputed from the current state on
/// every call.
pub struct VisualizationStore {
    state: Arc<RwLock<StoreState>>,

    /// Parser used by `update_content`
    parser: Arc<dyn DatasetParser>,

    /// The event bus
    event_bus: Arc<EventBus>,
}

impl VisualizationStore {
    /// Create a store with default settings
    pub fn new(parser: Arc<dyn DatasetParser>) -> Self {
        Self::build(parser, VisualizationConfig::default())
    }

    /// Create a store seeded from a configuration
    pub fn with_config(parser: Arc<dyn DatasetParser>, config: VisualizationConfig) -> Result<Self, StoreError> {
        check_delimiter(&config.delimiter)?;
        Ok(Self::build(parser, config))
    }

    fn build(parser: Arc<dyn DatasetParser>, config: VisualizationConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::from_config(config))),
            parser,
            event_bus: Arc::new(EventBus::new()),
        }
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        self.event_bus.clone()
    }

    pub fn raw_text(&self) -> String {
        self.state.read().raw_text.clone()
    }

    pub fn dataset(&self) -> Arc<Dataset> {
        self.state.read().dataset.clone()
    }

    pub fn selection(&self) -> ColumnSelection {
        self.state.read().selection.clone()
    }

    pub fn delimiter(&self) -> String {
        self.state.read().delimiter.clone()
    }

    pub fn radius(&self) -> f64 {
        self.state.read().radius
    }

    pub fn blur(&self) -> f64 {
        self.state.read().blur
    }

    pub fn tile_source_url(&self) -> String {
        self.state.read().tile_source_url.clone()
    }

    // Derived queries

    /// Header of the current dataset, empty when it has no records
    pub fn get_columns(&self) -> Vec<String> {
        queries::columns(&self.state.read().dataset)
    }

    /// Locations derived from the current dataset and column selection
    pub fn get_locations(&self) -> Vec<Location> {
        let state = self.state.read();
        queries::locations(&state.dataset, &state.selection)
    }

    // Single-field mutations

    /// Replace the raw text without parsing it; returns the new content ticket
    pub fn change_text(&self, text: impl Into<String>) -> u64 {
        self.begin_update(text.into()).0
    }

    /// Replace the dataset wholesale, bypassing the parser
    pub fn change_dataset(&self, dataset: Dataset) {
        let (generation, rows, columns) = {
            let mut state = self.state.write();
            Self::drop_missing_columns(&mut state.selection, &dataset);
            let counts = (state.content_generation, dataset.len(), dataset.header.len());
            state.dataset = Arc::new(dataset);
            counts
        };
        self.event_bus.publish(events::DatasetCommitted {
            generation,
            row_count: rows,
            column_count: columns,
        });
    }

    pub fn set_radius(&self, radius: f64) {
        self.state.write().radius = radius;
        self.event_bus.publish(events::FieldChanged { field: StoreField::Radius });
    }

    pub fn set_blur(&self, blur: f64) {
        self.state.write().blur = blur;
        self.event_bus.publish(events::FieldChanged { field: StoreField::Blur });
    }

    pub fn set_delimiter(&self, delimiter: impl Into<String>) -> Result<(), StoreError> {
        let delimiter = delimiter.into();
        check_delimiter(&delimiter)?;
        self.state.write().delimiter = delimiter;
        self.event_bus.publish(events::FieldChanged { field: StoreField::Delimiter });
        Ok(())
    }

    pub fn set_tile_source_url(&self, url: impl Into<String>) {
        self.state.write().tile_source_url = url.into();
        self.event_bus.publish(events::FieldChanged { field: StoreField::TileSourceUrl });
    }

    /// Select (or clear with `None`) the column playing `role`.
    ///
    /// While a header is loaded the column must be part of it.
    pub fn set_column(&self, role: ColumnRole, column: Option<String>) -> Result<(), StoreError> {
        {
            let mut state = self.state.write();
            if let Some(name) = &column {
                if !state.dataset.header.is_empty() && !state.dataset.has_column(name) {
                    return Err(StoreError::UnknownColumn(name.clone()));
                }
            }
            match role {
                ColumnRole::Latitude => state.selection.latitude = column,
                ColumnRole::Longitude => state.selection.longitude = column,
                ColumnRole::Multiplier => state.selection.multiplier = column,
            }
        }
        self.event_bus.publish(events::FieldChanged { field: StoreField::Column(role) });
        Ok(())
    }

    /// Assign a field from its textual value.
    ///
    /// An empty value clears a column selection.
    pub fn set_field(&self, field: StoreField, value: &str) -> Result<(), StoreError> {
        let invalid = || StoreError::InvalidValue { field, value: value.to_string() };
        match field {
            StoreField::Radius => {
                let radius = value.trim().parse::<f64>().map_err(|_| invalid())?;
                self.set_radius(radius);
                Ok(())
            }
            StoreField::Blur => {
                let blur = value.trim().parse::<f64>().map_err(|_| invalid())?;
                self.set_blur(blur);
                Ok(())
            }
            StoreField::Delimiter => self.set_delimiter(value),
            StoreField::TileSourceUrl => {
                self.set_tile_source_url(value);
                Ok(())
            }
            StoreField::Column(role) => {
                let column = (!value.is_empty()).then(|| value.to_string());
                self.set_column(role, column)
            }
        }
    }

    // Content updates

    /// Replace the raw text and reparse it with the current delimiter.
    ///
    /// The dataset is only replaced when the parse succeeds; on failure the
    /// previous dataset stays current while the new text remains visible.
    pub fn update_content(&self, text: impl Into<String>) -> Result<ParseOutcome, StoreError> {
        let text = text.into();
        let (generation, delimiter) = self.begin_update(text.clone());
        let result = self.parser.parse(&text, &delimiter);
        self.commit(generation, result)
    }

    /// Asynchronous variant of [`update_content`](Self::update_content).
    ///
    /// If another update is requested before this parse resolves, this result
    /// is discarded and reported as [`ParseOutcome::Superseded`].
    pub async fn update_content_async(&self, text: impl Into<String>) -> Result<ParseOutcome, StoreError> {
        let text = text.into();
        let (generation, delimiter) = self.begin_update(text.clone());
        let result = self.parser.parse_async(&text, &delimiter).await;
        self.commit(generation, result)
    }

    /// Commit the new text and hand out a ticket for the parse that follows
    fn begin_update(&self, text: String) -> (u64, String) {
        let (generation, delimiter, text_len) = {
            let mut state = self.state.write();
            state.content_generation += 1;
            state.raw_text = text;
            (state.content_generation, state.delimiter.clone(), state.raw_text.len())
        };
        debug!("Content update #{} ({} bytes)", generation, text_len);
        self.event_bus.publish(events::ContentChanged { generation, text_len });
        (generation, delimiter)
    }

    fn commit(&self, generation: u64, result: anyhow::Result<Dataset>) -> Result<ParseOutcome, StoreError> {
        let mut state = self.state.write();
        let latest = state.content_generation;

        if generation != latest {
            drop(state);
            debug!("Discarding parse #{} superseded by #{}", generation, latest);
            self.event_bus.publish(events::ParseSuperseded { generation, latest });
            return Ok(ParseOutcome::Superseded { generation, latest });
        }

        match result {
            Ok(dataset) => {
                Self::drop_missing_columns(&mut state.selection, &dataset);
                let rows = dataset.len();
                let columns = dataset.header.len();
                state.dataset = Arc::new(dataset);
                drop(state);

                info!("Committed dataset #{}: {} rows, {} columns", generation, rows, columns);
                self.event_bus.publish(events::DatasetCommitted {
                    generation,
                    row_count: rows,
                    column_count: columns,
                });
                Ok(ParseOutcome::Committed { generation, rows, columns })
            }
            Err(e) => {
                drop(state);
                warn!("Parse #{} rejected, keeping previous dataset: {}", generation, e);
                self.event_bus.publish(events::ParseRejected {
                    generation,
                    error: e.to_string(),
                });
                Err(StoreError::Parse(e.to_string()))
            }
        }
    }

    /// Clear selections that do not exist in the new header
    fn drop_missing_columns(selection: &mut ColumnSelection, dataset: &Dataset) {
        for slot in [&mut selection.latitude, &mut selection.longitude, &mut selection.multiplier] {
            let missing = slot.as_deref().map_or(false, |column| !dataset.has_column(column));
            if missing {
                debug!("Clearing selection of missing column {:?}", slot);
                *slot = None;
            }
        }
    }
}

fn check_delimiter(delimiter: &str) -> Result<(), StoreError> {
    if delimiter.is_empty() {
        return Err(StoreError::InvalidValue {
            field: StoreField::Delimiter,
            value: delimiter.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{CellValue, Record};
    use crate::events::handler_from_fn;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Minimal splitter; text containing "slow" takes a while, "!" fails
    struct FakeParser;

    impl FakeParser {
        fn split(text: &str, delimiter: &str) -> anyhow::Result<Dataset> {
            if text.contains('!') {
                anyhow::bail!("malformed row");
            }
            let mut lines = text.trim().lines();
            let header: Vec<String> = match lines.next() {
                Some(line) => line.split(delimiter).map(str::to_string).collect(),
                None => return Ok(Dataset::default()),
            };
            let records = lines
                .map(|line| {
                    header
                        .iter()
                        .cloned()
                        .zip(line.split(delimiter).map(CellValue::from))
                        .collect::<Record>()
                })
                .collect();
            Ok(Dataset::new(header, records))
        }
    }

    #[async_trait::async_trait]
    impl DatasetParser for FakeParser {
        fn parse(&self, text: &str, delimiter: &str) -> anyhow::Result<Dataset> {
            Self::split(text, delimiter)
        }

        async fn parse_async(&self, text: &str, delimiter: &str) -> anyhow::Result<Dataset> {
            if text.contains("slow") {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Self::split(text, delimiter)
        }
    }

    fn store() -> VisualizationStore {
        VisualizationStore::new(Arc::new(FakeParser))
    }

    #[test]
    fn test_update_content_and_locations() {
        let store = store();
        let outcome = store.update_content("lat,lon\n1,2\n3,4").unwrap();
        assert!(matches!(outcome, ParseOutcome::Committed { rows: 2, columns: 2, .. }));

        assert!(store.get_locations().is_empty());
        store.set_field(StoreField::Column(ColumnRole::Latitude), "lat").unwrap();
        assert!(store.get_locations().is_empty());
        store.set_field(StoreField::Column(ColumnRole::Longitude), "lon").unwrap();

        assert_eq!(
            store.get_locations(),
            vec![Location::new(1.0, 2.0), Location::new(3.0, 4.0)]
        );
        assert_eq!(store.get_columns(), vec!["lat".to_string(), "lon".to_string()]);
    }

    #[test]
    fn test_locations_follow_dataset_length() {
        let store = store();
        store.update_content("lat;lon;mag\n1;1;5").unwrap();
        assert_eq!(store.get_columns(), vec!["lat;lon;mag".to_string()]);

        store.set_delimiter(";").unwrap();
        store.update_content("lat;lon;mag\n1;1;5\n2;2;15\n3;3;10").unwrap();
        store.set_column(ColumnRole::Latitude, Some("lat".into())).unwrap();
        store.set_column(ColumnRole::Longitude, Some("lon".into())).unwrap();
        store.set_column(ColumnRole::Multiplier, Some("mag".into())).unwrap();

        let locations = store.get_locations();
        assert_eq!(locations.len(), store.dataset().len());
        let mags: Vec<f64> = locations.iter().filter_map(|l| l.magnitude).collect();
        assert_eq!(mags, vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn test_failed_parse_keeps_previous_dataset() {
        let store = store();
        store.update_content("a,b\n1,2").unwrap();
        let before = store.dataset();

        let result = store.update_content("a,b\n1,2!");
        assert!(matches!(result, Err(StoreError::Parse(_))));
        assert_eq!(store.raw_text(), "a,b\n1,2!");
        assert_eq!(*store.dataset(), *before);
    }

    #[test]
    fn test_unknown_column_rejected() {
        let store = store();
        // No header yet: any name is accepted
        store.set_column(ColumnRole::Latitude, Some("lat".into())).unwrap();

        store.update_content("y,x\n1,2").unwrap();
        assert_eq!(store.selection().latitude, None);
        assert!(matches!(
            store.set_column(ColumnRole::Latitude, Some("lat".into())),
            Err(StoreError::UnknownColumn(_))
        ));
        store.set_field(StoreField::Column(ColumnRole::Latitude), "y").unwrap();
        store.set_field(StoreField::Column(ColumnRole::Latitude), "").unwrap();
        assert_eq!(store.selection().latitude, None);
    }

    #[test]
    fn test_set_field_coerces_numbers() {
        let store = store();
        assert_eq!(store.radius(), 7.0);
        assert_eq!(store.blur(), 4.0);

        store.set_field("radius".parse().unwrap(), "12").unwrap();
        store.set_field(StoreField::Blur, " 2.5 ").unwrap();
        assert_eq!(store.radius(), 12.0);
        assert_eq!(store.blur(), 2.5);

        assert!(matches!(
            store.set_field(StoreField::Radius, "wide"),
            Err(StoreError::InvalidValue { .. })
        ));
        assert!(store.set_field(StoreField::Delimiter, "").is_err());
        store.set_field(StoreField::TileSourceUrl, "https://tiles/{z}/{x}/{y}.png").unwrap();
        assert_eq!(store.tile_source_url(), "https://tiles/{z}/{x}/{y}.png");
    }

    #[test]
    fn test_events_published() {
        let store = store();
        let commits = Arc::new(AtomicUsize::new(0));
        let counter = commits.clone();
        store.event_bus().subscribe::<events::DatasetCommitted>(handler_from_fn(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        store.update_content("a\n1").unwrap();
        let _ = store.update_content("a\n!");
        assert_eq!(commits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_may_mutate_store() {
        let store = Arc::new(store());
        let inner = store.clone();
        store.event_bus().subscribe::<events::DatasetCommitted>(handler_from_fn(move |_| {
            inner.set_blur(1.0);
        }));

        store.update_content("a\n1").unwrap();
        assert_eq!(store.blur(), 1.0);
    }

    #[test]
    fn test_change_dataset_replaces_wholesale() {
        let store = store();
        store.update_content("lat,lon,mag\n1,2,3").unwrap();
        store.set_column(ColumnRole::Latitude, Some("lat".into())).unwrap();
        store.set_column(ColumnRole::Longitude, Some("lon".into())).unwrap();
        store.set_column(ColumnRole::Multiplier, Some("mag".into())).unwrap();

        let commits = Arc::new(AtomicUsize::new(0));
        let counter = commits.clone();
        store.event_bus().subscribe::<events::DatasetCommitted>(handler_from_fn(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let replacement = FakeParser::split("lat,lon\n5,6\n7,8", ",").unwrap();
        store.change_dataset(replacement);

        assert_eq!(commits.load(Ordering::SeqCst), 1);
        assert_eq!(store.get_columns(), vec!["lat".to_string(), "lon".to_string()]);
        assert_eq!(store.selection().multiplier, None);
        assert_eq!(
            store.get_locations(),
            vec![Location::new(5.0, 6.0), Location::new(7.0, 8.0)]
        );
        // Raw text is untouched
        assert_eq!(store.raw_text(), "lat,lon,mag\n1,2,3");
    }

    #[test]
    fn test_change_text_does_not_parse() {
        let store = store();
        store.update_content("a\n1").unwrap();

        let generation = store.change_text("b\n2\n3");
        assert_eq!(generation, 2);
        assert_eq!(store.raw_text(), "b\n2\n3");
        assert_eq!(store.get_columns(), vec!["a".to_string()]);
    }

    #[test]
    fn test_config_delimiter_is_validated() {
        let config = VisualizationConfig {
            delimiter: String::new(),
            ..VisualizationConfig::default()
        };
        assert!(matches!(
            VisualizationStore::with_config(Arc::new(FakeParser), config),
            Err(StoreError::InvalidValue { field: StoreField::Delimiter, .. })
        ));

        let config = VisualizationConfig {
            delimiter: ";".to_string(),
            ..VisualizationConfig::default()
        };
        let store = VisualizationStore::with_config(Arc::new(FakeParser), config).unwrap();
        assert_eq!(store.delimiter(), ";");
    }

    #[tokio::test]
    async fn test_change_text_supersedes_pending_parse() {
        let store = store();
        let (parsed, generation) = tokio::join!(
            store.update_content_async("slow\n1\n2"),
            async { store.change_text("edited") },
        );

        assert_eq!(generation, 2);
        assert_eq!(parsed.unwrap(), ParseOutcome::Superseded { generation: 1, latest: 2 });
        assert_eq!(store.raw_text(), "edited");
        assert!(store.dataset().is_empty());
    }

    #[tokio::test]
    async fn test_async_update_commits() {
        let store = store();
        let outcome = store.update_content_async("lat,lon\n5,6").await.unwrap();
        assert!(matches!(outcome, ParseOutcome::Committed { rows: 1, .. }));
        assert_eq!(store.dataset().len(), 1);

        let rejected = store.update_content_async("lat,lon\n!").await;
        assert!(rejected.is_err());
        assert_eq!(store.dataset().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_parse_is_discarded() {
        let store = store();
        let (slow, fast) = tokio::join!(
            store.update_content_async("slow\n1\n2\n3"),
            store.update_content_async("fast\n1"),
        );

        assert_eq!(slow.unwrap(), ParseOutcome::Superseded { generation: 1, latest: 2 });
        assert!(matches!(fast.unwrap(), ParseOutcome::Committed { generation: 2, rows: 1, .. }));
        assert_eq!(store.raw_text(), "fast\n1");
        assert_eq!(store.get_columns(), vec!["fast".to_string()]);
    }
}
