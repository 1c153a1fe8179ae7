//! Display formatting for persons, materials, loans, rentals and repairs

use chrono::NaiveDate;
use tabled::Tabled;

use super::report::truncate;
use super::{render_table, DisplayContext};
use crate::models::{DepositOutcome, Loan, Person, Repair};
use crate::services::{MaterialHistory, MaterialWithStatus, PricedRental, RepairService};

#[derive(Tabled)]
struct PersonRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Email")]
    email: String,
}

pub fn format_person_list(persons: &[Person]) -> String {
    if persons.is_empty() {
        return "No persons found.".to_string();
    }

    let rows = persons
        .iter()
        .map(|p| PersonRow {
            id: p.id.to_string(),
            name: truncate(&p.name, 30),
            phone: p.phone.clone().unwrap_or_default(),
            email: p.email.clone().unwrap_or_default(),
        })
        .collect();

    render_table(rows, 0..0)
}

pub fn format_person_details(person: &Person) -> String {
    let mut output = String::new();
    output.push_str(&format!("Person: {}\n", person.name));
    output.push_str(&format!("  ID:    {}\n", person.id));
    if let Some(phone) = &person.phone {
        output.push_str(&format!("  Phone: {}\n", phone));
    }
    if let Some(email) = &person.email {
        output.push_str(&format!("  Email: {}\n", email));
    }
    if !person.notes.is_empty() {
        output.push_str(&format!("  Notes: {}\n", person.notes));
    }
    output
}

#[derive(Tabled)]
struct MaterialRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Brand")]
    brand: String,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub fn format_material_list(materials: &[MaterialWithStatus]) -> String {
    if materials.is_empty() {
        return "No materials found.".to_string();
    }

    let rows = materials
        .iter()
        .map(|entry| MaterialRow {
            id: entry.material.id.to_string(),
            name: truncate(&entry.material.name, 30),
            category: entry.material.category.clone(),
            brand: entry.material.brand.clone().unwrap_or_default(),
            serial: entry.material.serial_number.clone().unwrap_or_default(),
            status: entry.status.to_string(),
        })
        .collect();

    render_table(rows, 0..0)
}

/// Format a material with its status and history
pub fn format_material_details(
    entry: &MaterialWithStatus,
    history: &MaterialHistory,
    documents: usize,
    ctx: &DisplayContext,
) -> String {
    let material = &entry.material;

    let mut output = String::new();
    output.push_str(&format!("Material: {}\n", material.name));
    output.push_str(&format!("  ID:             {}\n", material.id));
    output.push_str(&format!("  Status:         {}\n", entry.status));
    if !material.category.is_empty() {
        output.push_str(&format!("  Category:       {}\n", material.category));
    }
    if let Some(brand) = &material.brand {
        output.push_str(&format!("  Brand:          {}\n", brand));
    }
    if let Some(serial) = &material.serial_number {
        output.push_str(&format!("  Serial number:  {}\n", serial));
    }
    if let Some(date) = material.purchase_date {
        output.push_str(&format!("  Purchased:      {}\n", ctx.date(date)));
    }
    if let Some(price) = material.purchase_price {
        output.push_str(&format!("  Purchase price: {}\n", price));
    }
    if documents > 0 {
        output.push_str(&format!("  Documents:      {} in the vault\n", documents));
    }
    if !material.notes.is_empty() {
        output.push_str(&format!("  Notes:          {}\n", material.notes));
    }

    let mut events: Vec<(NaiveDate, String)> = Vec::new();
    for loan in &history.loans {
        events.push((
            loan.start_date,
            format!(
                "Loaned to {} until {}",
                ctx.person(loan.person_id),
                ctx.opt_date(loan.returned_on.or(loan.expected_return))
            ),
        ));
    }
    for rental in &history.rentals {
        events.push((
            rental.start_date,
            format!(
                "Rented to {} until {}",
                ctx.person(rental.person_id),
                ctx.date(rental.returned_on.unwrap_or(rental.end_date))
            ),
        ));
    }
    for repair in &history.repairs {
        events.push((
            repair.start_date,
            format!("Repair: {} ({})", repair.description, repair.status),
        ));
    }
    events.sort_by(|a, b| a.0.cmp(&b.0));

    if !events.is_empty() {
        output.push_str("\nHistory:\n");
        for (date, text) in events {
            output.push_str(&format!("  {}  {}\n", ctx.date(date), text));
        }
    }
    output
}

#[derive(Tabled)]
struct LoanRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Material")]
    material: String,
    #[tabled(rename = "Borrower")]
    person: String,
    #[tabled(rename = "Since")]
    start: String,
    #[tabled(rename = "Expected")]
    expected: String,
    #[tabled(rename = "Returned")]
    returned: String,
}

pub fn format_loan_list(loans: &[Loan], today: NaiveDate, ctx: &DisplayContext) -> String {
    if loans.is_empty() {
        return "No loans found.".to_string();
    }

    let rows = loans
        .iter()
        .map(|l| LoanRow {
            id: l.id.to_string(),
            material: truncate(&ctx.material(l.material_id), 24),
            person: truncate(&ctx.person(l.person_id), 24),
            start: ctx.date(l.start_date),
            expected: if l.is_overdue(today) {
                format!("{} (overdue)", ctx.opt_date(l.expected_return))
            } else {
                ctx.opt_date(l.expected_return)
            },
            returned: ctx.opt_date(l.returned_on),
        })
        .collect();

    render_table(rows, 0..0)
}

#[derive(Tabled)]
struct RentalRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Material")]
    material: String,
    #[tabled(rename = "Renter")]
    person: String,
    #[tabled(rename = "From")]
    start: String,
    #[tabled(rename = "To")]
    end: String,
    #[tabled(rename = "Days")]
    days: i64,
    #[tabled(rename = "Total TTC")]
    total: String,
    #[tabled(rename = "Deposit")]
    deposit: String,
    #[tabled(rename = "Payment")]
    payment: String,
}

fn deposit_text(rental: &PricedRental) -> String {
    let r = &rental.rental;
    match r.deposit_outcome {
        DepositOutcome::Pending if r.deposit.is_zero() => "-".into(),
        DepositOutcome::Pending => format!("{} held", r.deposit),
        outcome => outcome.to_string(),
    }
}

pub fn format_rental_list(rentals: &[PricedRental], ctx: &DisplayContext) -> String {
    if rentals.is_empty() {
        return "No rentals found.".to_string();
    }

    let rows = rentals
        .iter()
        .map(|p| RentalRow {
            id: p.rental.id.to_string(),
            material: truncate(&ctx.material(p.rental.material_id), 24),
            person: truncate(&ctx.person(p.rental.person_id), 24),
            start: ctx.date(p.rental.start_date),
            end: ctx.date(p.rental.end_date),
            days: p.days,
            total: p.pricing.net_incl_tax.to_string(),
            deposit: deposit_text(p),
            payment: p.rental.payment.to_string(),
        })
        .collect();

    render_table(rows, 5..7)
}

/// Format a rental with its price breakdown and deposit
pub fn format_rental_details(priced: &PricedRental, ctx: &DisplayContext) -> String {
    let rental = &priced.rental;
    let pricing = &priced.pricing;

    let mut output = String::new();
    output.push_str(&format!("Rental: {}\n", rental.id));
    output.push_str(&format!("  Material:   {}\n", ctx.material(rental.material_id)));
    output.push_str(&format!("  Renter:     {}\n", ctx.person(rental.person_id)));
    output.push_str(&format!(
        "  Period:     {} to {} ({} days)\n",
        ctx.date(rental.start_date),
        ctx.date(rental.end_date),
        priced.days
    ));
    output.push_str(&format!("  Daily rate: {} HT ({})\n", rental.daily_rate, rental.vat_rate));
    output.push('\n');
    output.push_str(&format!("  Gross HT:   {:>14}\n", pricing.gross_excl_tax.to_string()));
    output.push_str(&format!("  VAT:        {:>14}\n", pricing.tax.to_string()));
    output.push_str(&format!("  Gross TTC:  {:>14}\n", pricing.gross_incl_tax.to_string()));
    if !pricing.discount.is_zero() {
        output.push_str(&format!(
            "  Discount:   {:>14}  ({})\n",
            format!("-{}", pricing.discount),
            rental.discount
        ));
    }
    output.push_str(&format!("  Net TTC:    {:>14}\n", pricing.net_incl_tax.to_string()));
    output.push('\n');
    output.push_str(&format!("  Deposit:    {}\n", deposit_text(priced)));
    output.push_str(&format!("  Payment:    {}\n", rental.payment));
    if let Some(date) = rental.returned_on {
        output.push_str(&format!("  Returned:   {}\n", ctx.date(date)));
    }
    output
}

#[derive(Tabled)]
struct RepairRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Material")]
    material: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Repairer")]
    repairer: String,
    #[tabled(rename = "Started")]
    start: String,
    #[tabled(rename = "Cost TTC")]
    cost: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub fn format_repair_list(repairs: &[Repair], ctx: &DisplayContext) -> String {
    if repairs.is_empty() {
        return "No repairs found.".to_string();
    }

    let rows = repairs
        .iter()
        .map(|r| RepairRow {
            id: r.id.to_string(),
            material: truncate(&ctx.material(r.material_id), 24),
            description: truncate(&r.description, 30),
            repairer: match r.repairer_id {
                Some(id) => ctx.person(id),
                None => r.repairer.clone(),
            },
            start: ctx.date(r.start_date),
            cost: RepairService::pricing(r).net_incl_tax.to_string(),
            status: r.status.to_string(),
        })
        .collect();

    render_table(rows, 5..6)
}
