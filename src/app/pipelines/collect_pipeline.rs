use crate::adapters::csv_store;
use crate::adapters::PublicDataClient;
use crate::config::toml_config::API_KEY_ENV;
use crate::config::{AccessConfig, ApiFailurePolicy};
use crate::core::{Pipeline, Record, Storage};
use crate::domain::fields::FieldResolver;
use crate::domain::geo;
use crate::domain::model::{CollectedData, Dataset, RawCollection};
use crate::domain::region::RegionFilter;
use crate::domain::sample;
use crate::utils::error::{AccessError, Result};
use async_trait::async_trait;

/// Pulls the three datasets, keeps the configured region and writes the CSV tables.
pub struct CollectPipeline<S: Storage> {
    storage: S,
    config: AccessConfig,
    offline: bool,
    collected_on: String,
}

impl<S: Storage> CollectPipeline<S> {
    pub fn new(storage: S, config: AccessConfig) -> Self {
        Self {
            storage,
            config,
            offline: false,
            collected_on: chrono::Local::now().format("%Y-%m-%d").to_string(),
        }
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn with_collection_date(mut self, date: impl Into<String>) -> Self {
        self.collected_on = date.into();
        self
    }

    fn allows_sample(&self, dataset: Dataset) -> bool {
        dataset != Dataset::DisabilityFacilities
            && self.config.api.on_api_failure == ApiFailurePolicy::UseSampleData
    }

    fn read_local(&self, dataset: Dataset, path: &str) -> Result<Vec<Record>> {
        tracing::info!("📂 Reading {} from local file {}", dataset.label(), path);
        let bytes = std::fs::read(path)?;
        csv_store::raw_records(&bytes)
    }

    async fn fetch(&self, dataset: Dataset) -> Result<Vec<Record>> {
        let key = self
            .config
            .service_key()
            .map_err(|_| AccessError::MissingConfigError {
                field: format!("api.service_key or {}", API_KEY_ENV),
            })?;
        let client = PublicDataClient::new(key, &self.config.api)?;
        let endpoint = self.config.endpoint(dataset);
        tracing::info!("🌐 Fetching {} from {}", dataset.label(), endpoint);
        client
            .fetch_all(&endpoint, &self.config.parameters(dataset))
            .await
    }

    fn resolve(&self, raw: &RawCollection, region: &RegionFilter) -> CollectedData {
        let mut data = CollectedData::default();
        let min_width = self.config.analysis.min_accessible_width_m;

        for dataset in Dataset::ALL {
            let resolver = FieldResolver::new(
                dataset,
                Some(&self.config.source(dataset).field_aliases),
            );
            let records = raw.records(dataset);
            let in_region: Vec<(usize, &Record, Option<String>)> = records
                .iter()
                .filter(|record| {
                    let address = resolver.text(record, "address").unwrap_or_default();
                    region.matches(resolver.text(record, "province").as_deref(), &address)
                })
                .enumerate()
                .map(|(i, record)| {
                    let address = resolver.text(record, "address").unwrap_or_default();
                    let district = region.district_for(resolver.text(record, "district"), &address);
                    (i, record, district)
                })
                .collect();

            tracing::info!(
                "🔎 {}: {} of {} records are in {}",
                dataset.label(),
                in_region.len(),
                records.len(),
                region.name()
            );

            for (i, record, district) in in_region {
                match dataset {
                    Dataset::ChargingStation => data.charging_stations.push(
                        resolver.charging_station(record, i, district, &self.collected_on),
                    ),
                    Dataset::Walkway => data.walkways.push(resolver.walkway(
                        record,
                        i,
                        district,
                        &self.collected_on,
                        min_width,
                    )),
                    Dataset::DisabilityFacilities => {
                        data.facilities.push(resolver.facility(record, i, district))
                    }
                }
            }
        }

        data
    }
}

#[async_trait]
impl<S: Storage> Pipeline for CollectPipeline<S> {
    type Extracted = RawCollection;
    type Transformed = CollectedData;

    fn name(&self) -> &str {
        "collect"
    }

    async fn extract(&self) -> Result<RawCollection> {
        let mut raw = RawCollection::default();

        if self.offline {
            tracing::warn!("📴 Offline mode, using sample data for stations and walkways");
            raw.sample_fallback = vec![Dataset::ChargingStation, Dataset::Walkway];
            return Ok(raw);
        }

        for dataset in Dataset::ALL {
            let source = self.config.source(dataset);
            if !source.enabled {
                tracing::info!("⏭️ {} disabled, skipping", dataset.label());
                continue;
            }

            let result = match &source.local_file {
                Some(path) => self.read_local(dataset, path),
                None => self.fetch(dataset).await,
            };

            match result {
                Ok(records) => {
                    tracing::info!("📥 {}: {} records", dataset.label(), records.len());
                    raw.records.insert(dataset, records);
                }
                Err(e) if self.allows_sample(dataset) => {
                    tracing::warn!("⚠️ {} collection failed: {}", dataset.label(), e);
                    tracing::warn!("📝 Falling back to sample data for {}", dataset.label());
                    raw.sample_fallback.push(dataset);
                }
                Err(e)
                    if dataset == Dataset::DisabilityFacilities
                        && self.config.api.on_api_failure == ApiFailurePolicy::UseSampleData =>
                {
                    tracing::warn!(
                        "⚠️ {} collection failed, continuing without it: {}",
                        dataset.label(),
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Ok(raw)
    }

    async fn transform(&self, raw: RawCollection) -> Result<CollectedData> {
        let region = self.config.region_filter()?;
        let mut data = self.resolve(&raw, &region);
        let spec = self.config.sample_spec(&self.collected_on);

        if raw.used_sample(Dataset::ChargingStation)
            || (data.charging_stations.is_empty() && self.allows_sample(Dataset::ChargingStation))
        {
            tracing::warn!("📝 Using {} sample charging stations", sample::SAMPLE_STATION_COUNT);
            data.charging_stations = sample::charging_stations(&spec);
        }
        if raw.used_sample(Dataset::Walkway)
            || (data.walkways.is_empty() && self.allows_sample(Dataset::Walkway))
        {
            tracing::warn!("📝 Using {} sample walkways", sample::SAMPLE_WALKWAY_COUNT);
            data.walkways = sample::walkways(&spec);
        }

        geo::enrich(
            &mut data.charging_stations,
            &mut data.walkways,
            &self.config.proximity_rules(),
        );

        tracing::info!(
            "🔧 Collected {} stations, {} walkways, {} facilities",
            data.charging_stations.len(),
            data.walkways.len(),
            data.facilities.len()
        );
        Ok(data)
    }

    async fn load(&self, data: CollectedData) -> Result<Vec<String>> {
        let mut written = Vec::new();
        tracing::info!("💾 Writing {} records", data.total_records());

        csv_store::write_table(
            &self.storage,
            Dataset::ChargingStation.file_name(),
            &data.charging_stations,
        )
        .await?;
        written.push(Dataset::ChargingStation.file_name());

        csv_store::write_table(&self.storage, Dataset::Walkway.file_name(), &data.walkways).await?;
        written.push(Dataset::Walkway.file_name());

        if !data.facilities.is_empty() {
            csv_store::write_table(
                &self.storage,
                Dataset::DisabilityFacilities.file_name(),
                &data.facilities,
            )
            .await?;
            written.push(Dataset::DisabilityFacilities.file_name());
        }

        let paths: Vec<String> = written
            .into_iter()
            .map(|file| format!("{}/{}", self.config.output.data_dir, file))
            .collect();
        for path in &paths {
            tracing::info!("💾 Saved {}", path);
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cli::LocalStorage;
    use std::collections::HashMap;

    fn pipeline(dir: &std::path::Path, config: AccessConfig) -> CollectPipeline<LocalStorage> {
        CollectPipeline::new(LocalStorage::new(dir.to_string_lossy().to_string()), config)
            .with_collection_date("2025-03-01")
    }

    fn record(pairs: &[(&str, &str)]) -> Record {
        Record::from_pairs(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    #[tokio::test]
    async fn test_transform_filters_region_and_resolves_district() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AccessConfig::default();
        config.api.on_api_failure = ApiFailurePolicy::Fail;
        let pipeline = pipeline(dir.path(), config);

        let mut records = HashMap::new();
        records.insert(
            Dataset::ChargingStation,
            vec![
                record(&[
                    ("fcltyNm", "대구역"),
                    ("rdnmadr", "대구광역시 북구 태평로 161"),
                    ("latitude", "35.8796"),
                    ("longitude", "128.5962"),
                ]),
                record(&[("fcltyNm", "부산역"), ("rdnmadr", "부산광역시 동구 중앙대로 206")]),
                record(&[
                    ("fcltyNm", "수성구청"),
                    ("ctprvnNm", "대구광역시"),
                    ("signguNm", "수성구"),
                ]),
            ],
        );
        records.insert(
            Dataset::Walkway,
            vec![record(&[
                ("walkwayName", "태평로 보행로"),
                ("address", "대구광역시 북구 태평로"),
                ("latitude", "35.8790"),
                ("longitude", "128.5962"),
                ("widthMeters", "2.0"),
            ])],
        );
        let raw = RawCollection {
            records,
            sample_fallback: Vec::new(),
        };

        let data = pipeline.transform(raw).await.unwrap();
        assert_eq!(data.charging_stations.len(), 2);
        assert_eq!(data.charging_stations[0].district.as_deref(), Some("북구"));
        assert_eq!(data.charging_stations[1].district.as_deref(), Some("수성구"));
        assert_eq!(data.charging_stations[1].station_id, "CS-0002");
        assert!(data.charging_stations[0].near_walkway);
        assert!(!data.charging_stations[1].near_walkway);
        assert!(data.walkways[0].wheelchair_accessible);
        assert!(data.facilities.is_empty());
    }

    #[tokio::test]
    async fn test_offline_run_writes_sample_tables() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path(), AccessConfig::default()).with_offline(true);

        let raw = pipeline.extract().await.unwrap();
        let data = pipeline.transform(raw).await.unwrap();
        assert_eq!(data.charging_stations.len(), sample::SAMPLE_STATION_COUNT);
        assert_eq!(data.walkways.len(), sample::SAMPLE_WALKWAY_COUNT);
        assert_eq!(
            data.total_records(),
            sample::SAMPLE_STATION_COUNT + sample::SAMPLE_WALKWAY_COUNT
        );

        let written = pipeline.load(data).await.unwrap();
        assert_eq!(written.len(), 2);
        assert!(dir.path().join("daegu_charging_stations.csv").exists());
        assert!(dir.path().join("daegu_walkways.csv").exists());
        assert!(!dir.path().join("daegu_disability_facilities.csv").exists());
    }

    #[tokio::test]
    async fn test_missing_key_with_fail_policy_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AccessConfig::default();
        config.api.service_key = None;
        config.api.on_api_failure = ApiFailurePolicy::Fail;
        let pipeline = pipeline(dir.path(), config);

        assert!(pipeline.extract().await.is_err());
    }

    #[tokio::test]
    async fn test_request_errors_with_a_key_are_not_reported_as_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AccessConfig::default();
        config.api.service_key = Some("test-key".to_string());
        config.api.on_api_failure = ApiFailurePolicy::Fail;
        config.api.retry_count = 0;
        config.sources.charging_station.endpoint = Some("http://127.0.0.1:1/charging".to_string());
        let pipeline = pipeline(dir.path(), config);

        match pipeline.extract().await {
            Err(e @ AccessError::ApiError(_)) => assert_eq!(e.exit_code(), 2),
            other => panic!("expected a transport error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_local_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("chargers.csv");
        std::fs::write(
            &csv_path,
            "\u{feff}시설명,시도명,시군구명,소재지도로명주소,위도,경도,평일운영시작시각,공기주입가능여부\n\
             동대구역 충전기,대구광역시,동구,대구광역시 동구 동대구로 550,35.8793,128.6286,00:00,Y\n",
        )
        .unwrap();

        let mut config = AccessConfig::default();
        config.api.service_key = None;
        config.sources.charging_station.local_file = Some(csv_path.to_string_lossy().to_string());
        config.sources.walkway.enabled = false;
        config.sources.disability_facilities.enabled = false;
        let pipeline = pipeline(dir.path(), config);

        let raw = pipeline.extract().await.unwrap();
        assert_eq!(raw.records(Dataset::ChargingStation).len(), 1);

        let data = pipeline.transform(raw).await.unwrap();
        let station = &data.charging_stations[0];
        assert_eq!(station.station_name, "동대구역 충전기");
        assert_eq!(station.district.as_deref(), Some("동구"));
        assert!(station.is_open_all_day());
        assert!(station.air_pump);
        // walkways disabled, so the sample table stands in
        assert_eq!(data.walkways.len(), sample::SAMPLE_WALKWAY_COUNT);
    }
}
