use actix_web::{http::StatusCode, HttpResponse};
use askama::Template;

pub fn render<T: Template>(template: T) -> HttpResponse {
    render_with_status(StatusCode::OK, template)
}

pub fn render_with_status<T: Template>(status: StatusCode, template: T) -> HttpResponse {
    match template.render() {
        Ok(body) => HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(err) => {
            log::error!("Template render error: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

pub fn money(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    let whole = (cents / 100).to_string();
    let mut grouped = String::new();
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{sign}${grouped}.{:02}", cents % 100)
}

pub fn percent(value: f64) -> String {
    if value > 0.0 {
        format!("+{value:.1}%")
    } else {
        format!("{value:.1}%")
    }
}

pub fn short_date(timestamp: &str) -> String {
    timestamp.get(..10).unwrap_or(timestamp).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_groups_thousands() {
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(1234.5), "$1,234.50");
        assert_eq!(money(1_000_000.0), "$1,000,000.00");
        assert_eq!(money(-12.5), "-$12.50");
    }

    #[test]
    fn percent_marks_positive_growth() {
        assert_eq!(percent(12.345), "+12.3%");
        assert_eq!(percent(0.0), "0.0%");
        assert_eq!(percent(-50.0), "-50.0%");
    }

    #[test]
    fn short_date_keeps_the_day() {
        assert_eq!(short_date("2026-10-19T08:00:00Z"), "2026-10-19");
        assert_eq!(short_date("soon"), "soon");
    }
}
