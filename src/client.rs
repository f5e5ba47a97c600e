mod email_client;
mod notifier;
mod weather_client;

pub use email_client::{ConfirmationNotice, EmailClient, EmailError};
pub use notifier::{ConfirmationNotifier, EmailNotifier, LogNotifier};
pub use weather_client::{
    CitySuggestion, Condition, CurrentWeather, DaySummary, Forecast, ForecastDay, ForecastDays,
    Location, WeatherClient, WeatherError,
};
