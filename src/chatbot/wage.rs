use serde::Serialize;

/// Divisors fixed by the Employment Act 1955: an ordinary rate of pay of
/// one twenty-sixth of monthly wages, an eight-hour working day, and an
/// overtime rate of one and a half times the hourly rate.
const WORKING_DAYS_PER_MONTH: f64 = 26.0;
const WORKING_HOURS_PER_DAY: f64 = 8.0;
const OVERTIME_MULTIPLIER: f64 = 1.5;

const CITATION: &str = "Employment Act 1955, Sections 60I and 60A";

#[derive(Debug, Clone, Serialize)]
pub struct WageCalculation {
    pub steps: Vec<String>,
    pub citation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_overtime_pay: Option<f64>,
}

/// Deterministic wage breakdown. Inputs are validated upstream at the API
/// boundary (positive salary, non-negative overtime hours). Displayed step
/// values are rounded to two decimals; the returned overtime total is not.
pub fn calculate_wage(monthly_salary: f64, overtime_hours: f64) -> WageCalculation {
    let daily_wage = monthly_salary / WORKING_DAYS_PER_MONTH;
    let hourly_wage = daily_wage / WORKING_HOURS_PER_DAY;

    let mut steps = vec![
        format!(
            "Daily wage: RM{:.2} / {} days = RM{:.2}",
            monthly_salary, WORKING_DAYS_PER_MONTH as u32, daily_wage
        ),
        format!(
            "Hourly wage: RM{:.2} / {} hours = RM{:.2}",
            daily_wage, WORKING_HOURS_PER_DAY as u32, hourly_wage
        ),
    ];

    let total_overtime_pay = if overtime_hours > 0.0 {
        let overtime_rate = hourly_wage * OVERTIME_MULTIPLIER;
        let total = overtime_rate * overtime_hours;
        steps.push(format!(
            "Overtime rate: RM{:.2} x {} = RM{:.2}",
            hourly_wage, OVERTIME_MULTIPLIER, overtime_rate
        ));
        steps.push(format!(
            "Total overtime pay: RM{:.2} x {} hours = RM{:.2}",
            overtime_rate, overtime_hours, total
        ));
        Some(total)
    } else {
        None
    };

    WageCalculation {
        steps,
        citation: CITATION.to_string(),
        total_overtime_pay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wage_without_overtime() {
        let result = calculate_wage(2600.0, 0.0);
        assert_eq!(result.steps.len(), 2);
        assert!(result.steps[0].contains("RM100.00"));
        assert!(result.steps[1].contains("RM12.50"));
        assert!(result.total_overtime_pay.is_none());
        assert_eq!(result.citation, CITATION);
    }

    #[test]
    fn test_wage_with_overtime() {
        let result = calculate_wage(2600.0, 10.0);
        assert_eq!(result.steps.len(), 4);
        assert!(result.steps[2].contains("RM18.75"));
        assert!(result.steps[3].contains("RM187.50"));
        assert_eq!(result.total_overtime_pay, Some(187.5));
    }

    #[test]
    fn test_overtime_total_is_unrounded() {
        // 1000/26/8 * 1.5 * 3 carries more than two decimals.
        let result = calculate_wage(1000.0, 3.0);
        let expected = 1000.0 / 26.0 / 8.0 * 1.5 * 3.0;
        assert_eq!(result.total_overtime_pay, Some(expected));
    }

    #[test]
    fn test_deterministic() {
        let a = calculate_wage(3120.0, 7.5);
        let b = calculate_wage(3120.0, 7.5);
        assert_eq!(a.steps, b.steps);
        assert_eq!(a.total_overtime_pay, b.total_overtime_pay);
    }
}
