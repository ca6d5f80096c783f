use std::{fs, path::Path};

use ts_rs::TS;

fn generate_types_content() -> String {
    let decls = [
        utils::response::ApiResponse::<()>::decl(),
        utils::units::TemperatureUnit::decl(),
        utils::units::WindSpeedUnit::decl(),
        utils::units::PressureUnit::decl(),
        utils::units::VisibilityUnit::decl(),
        utils::chart::ChartMetric::decl(),
        utils::map::Rgb::decl(),
        utils::map::BoundingBox::decl(),
        utils::map::MapLayer::decl(),
        db::models::validation::FieldError::decl(),
        db::models::validation::ValidationErrors::decl(),
        db::models::user::Theme::decl(),
        db::models::user::UserPreferences::decl(),
        db::models::user::User::decl(),
        db::models::user::CreateUser::decl(),
        db::models::user::UpdateUserPreferences::decl(),
        db::models::user::LoginRequest::decl(),
        db::models::location::Location::decl(),
        db::models::location::CreateLocation::decl(),
        db::models::weather_data::WeatherDataType::decl(),
        db::models::weather_data::WeatherData::decl(),
        db::models::weather_data::CreateWeatherData::decl(),
        db::models::crop::Crop::decl(),
        db::models::crop::CreateCrop::decl(),
        db::models::crop_stage::CropStage::decl(),
        db::models::crop_stage::CreateCropStage::decl(),
        db::models::field::Field::decl(),
        db::models::field::CreateField::decl(),
        db::models::crop_planting::CropPlanting::decl(),
        db::models::crop_planting::CreateCropPlanting::decl(),
        db::models::agricultural_risk::RiskType::decl(),
        db::models::agricultural_risk::RiskDetails::decl(),
        db::models::agricultural_risk::AgriculturalRisk::decl(),
        db::models::agricultural_risk::CreateAgriculturalRisk::decl(),
        db::models::agronomic_recommendation::RecommendationPriority::decl(),
        db::models::agronomic_recommendation::AgronomicRecommendation::decl(),
        db::models::agronomic_recommendation::CreateAgronomicRecommendation::decl(),
        db::models::regional_risk::RegionalRiskScore::decl(),
        db::models::regional_risk::UpsertRegionalRiskScore::decl(),
        services::services::weather::UnitOverrides::decl(),
        services::services::weather::DisplayUnits::decl(),
        services::services::weather::CurrentWeatherDisplay::decl(),
        services::services::weather::CurrentWeather::decl(),
        services::services::weather::WeatherCondition::decl(),
        services::services::weather::ForecastDay::decl(),
        services::services::weather::DateRange::decl(),
        services::services::weather::HistoricalWeather::decl(),
        services::services::weather::ChartPoint::decl(),
        services::services::weather::HistoricalChart::decl(),
        services::services::weather::WeatherDashboard::decl(),
        services::services::phenology::CropView::decl(),
        services::services::phenology::PlantingStatus::decl(),
        services::services::risk::RiskLevel::decl(),
        services::services::risk::SortDirection::decl(),
        services::services::risk::RegionalRiskSummary::decl(),
        services::services::map::UpdateMapLayer::decl(),
        services::services::map::MapMarker::decl(),
        services::services::export::ExportFormat::decl(),
        services::services::database_validator::DatabaseHealth::decl(),
    ];

    let body = decls
        .into_iter()
        .map(|d| {
            let trimmed = d.trim_start();
            if trimmed.starts_with("export") {
                d
            } else {
                format!("export {trimmed}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "// This file was generated by `cargo run --bin generate_types`. Do not edit it by hand.\n\n{body}\n"
    )
}

fn main() -> anyhow::Result<()> {
    let check_mode = std::env::args().any(|arg| arg == "--check");
    let shared_path = Path::new("shared");
    let types_path = shared_path.join("types.ts");
    let generated = generate_types_content();

    if check_mode {
        let current = fs::read_to_string(&types_path).unwrap_or_default();
        if current == generated {
            println!("shared/types.ts is up to date.");
            return Ok(());
        }
        anyhow::bail!("shared/types.ts is out of date. Run `cargo run --bin generate_types`.");
    }

    fs::create_dir_all(shared_path)?;
    fs::write(&types_path, generated)?;
    println!("Wrote {}", types_path.display());
    Ok(())
}
