//! The request body for creating or replacing an entry and its validation.

use serde::Deserialize;

use crate::{
    Error,
    expense::core::{ExpenseDetails, ExpenseType},
    tax::TaxType,
};

/// The body of a request that creates or replaces an entry.
///
/// Every field is optional so that missing fields are reported with a
/// readable message instead of a deserialization error. Any `totalAmount`
/// sent by the client is ignored.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseForm {
    /// What the money was earned or spent on.
    pub description: Option<String>,
    /// The amount before tax.
    pub amount: Option<f64>,
    /// Either "income" or "expense".
    #[serde(rename = "type")]
    pub expense_type: Option<String>,
    /// Either "flat" or "percentage", defaults to "flat".
    pub tax_type: Option<String>,
    /// The flat tax or tax percentage, defaults to zero.
    pub tax_amount: Option<f64>,
}

impl ExpenseForm {
    /// Check the form and convert it into [ExpenseDetails].
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] describing the first invalid field, or
    /// when the tax-adjusted total does not fit in an `f64`.
    pub fn validate(self) -> Result<ExpenseDetails, Error> {
        let description = self
            .description
            .map(|description| description.trim().to_owned())
            .filter(|description| !description.is_empty())
            .ok_or_else(|| validation_error("Description is required"))?;

        let amount = self
            .amount
            .ok_or_else(|| validation_error("Amount is required"))?;

        if !amount.is_finite() || amount <= 0.0 {
            return Err(validation_error("Amount must be greater than 0"));
        }

        let expense_type = match self.expense_type.as_deref().map(str::trim) {
            None | Some("") => return Err(validation_error("Type is required")),
            Some(expense_type) => ExpenseType::try_from(expense_type)
                .map_err(|_| validation_error("Type must be either income or expense"))?,
        };

        let tax_type = match self.tax_type.as_deref().map(str::trim) {
            None | Some("") => TaxType::default(),
            Some(tax_type) => TaxType::try_from(tax_type)
                .map_err(|_| validation_error("Tax type must be either flat or percentage"))?,
        };

        let tax_amount = self.tax_amount.unwrap_or(0.0);

        if !tax_amount.is_finite() || tax_amount < 0.0 {
            return Err(validation_error("Tax amount cannot be negative"));
        }

        let details = ExpenseDetails {
            description,
            amount,
            expense_type,
            tax_type,
            tax_amount,
        };

        if !details.total_amount().is_finite() {
            return Err(validation_error("Total amount is too large"));
        }

        Ok(details)
    }
}

fn validation_error(message: &str) -> Error {
    Error::Validation(message.to_owned())
}

#[cfg(test)]
mod tests {
    use crate::{
        Error,
        expense::{
            core::{ExpenseDetails, ExpenseType},
            form::ExpenseForm,
        },
        tax::TaxType,
    };

    fn valid_form() -> ExpenseForm {
        ExpenseForm {
            description: Some("  Coffee ".to_owned()),
            amount: Some(4.0),
            expense_type: Some("expense".to_owned()),
            tax_type: Some("percentage".to_owned()),
            tax_amount: Some(10.0),
        }
    }

    #[test]
    fn valid_form_is_trimmed() {
        let details = valid_form().validate().unwrap();

        assert_eq!(
            details,
            ExpenseDetails {
                description: "Coffee".to_owned(),
                amount: 4.0,
                expense_type: ExpenseType::Expense,
                tax_type: TaxType::Percentage,
                tax_amount: 10.0,
            }
        );
    }

    #[test]
    fn tax_defaults_to_flat_zero() {
        let form = ExpenseForm {
            tax_type: None,
            tax_amount: None,
            ..valid_form()
        };

        let details = form.validate().unwrap();

        assert_eq!(details.tax_type, TaxType::Flat);
        assert_eq!(details.tax_amount, 0.0);
        assert_eq!(details.total_amount(), 4.0);
    }

    #[test]
    fn rejects_invalid_fields() {
        let cases = [
            (
                ExpenseForm {
                    description: Some("   ".to_owned()),
                    ..valid_form()
                },
                "Description is required",
            ),
            (
                ExpenseForm {
                    amount: None,
                    ..valid_form()
                },
                "Amount is required",
            ),
            (
                ExpenseForm {
                    amount: Some(0.0),
                    ..valid_form()
                },
                "Amount must be greater than 0",
            ),
            (
                ExpenseForm {
                    amount: Some(-5.0),
                    ..valid_form()
                },
                "Amount must be greater than 0",
            ),
            (
                ExpenseForm {
                    expense_type: None,
                    ..valid_form()
                },
                "Type is required",
            ),
            (
                ExpenseForm {
                    expense_type: Some("transfer".to_owned()),
                    ..valid_form()
                },
                "Type must be either income or expense",
            ),
            (
                ExpenseForm {
                    tax_type: Some("compound".to_owned()),
                    ..valid_form()
                },
                "Tax type must be either flat or percentage",
            ),
            (
                ExpenseForm {
                    tax_amount: Some(-1.0),
                    ..valid_form()
                },
                "Tax amount cannot be negative",
            ),
            (
                ExpenseForm {
                    amount: Some(1e308),
                    tax_type: Some("flat".to_owned()),
                    tax_amount: Some(1e308),
                    ..valid_form()
                },
                "Total amount is too large",
            ),
            (
                ExpenseForm {
                    amount: Some(1e307),
                    tax_type: Some("percentage".to_owned()),
                    tax_amount: Some(1e10),
                    ..valid_form()
                },
                "Total amount is too large",
            ),
        ];

        for (form, want_message) in cases {
            assert_eq!(
                form.validate(),
                Err(Error::Validation(want_message.to_owned()))
            );
        }
    }
}
