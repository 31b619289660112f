use charter_core::booking::{format_amount, FlightLeg, Language, Passenger, Ticket, TripType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Bilingual,
    Single(Language),
}

impl Layout {
    /// Parses the `lang` query parameter of the receipt endpoint.
    pub fn from_query(value: Option<&str>) -> Option<Self> {
        match value {
            None | Some("both") => Some(Layout::Bilingual),
            Some("en") => Some(Layout::Single(Language::En)),
            Some("es") => Some(Layout::Single(Language::Es)),
            Some(_) => None,
        }
    }
}

struct Labels {
    title: &'static str,
    reference: &'static str,
    issued: &'static str,
    trip: &'static str,
    one_way: &'static str,
    round_trip: &'static str,
    outbound: &'static str,
    inbound: &'static str,
    flight: &'static str,
    from: &'static str,
    to: &'static str,
    departure: &'static str,
    arrival: &'static str,
    passengers: &'static str,
    name: &'static str,
    birth_date: &'static str,
    nationality: &'static str,
    passport: &'static str,
    contact: &'static str,
    payment: &'static str,
    total: &'static str,
    footer: &'static str,
}

const EN: Labels = Labels {
    title: "E-Ticket Receipt",
    reference: "Booking reference",
    issued: "Issued",
    trip: "Trip",
    one_way: "One way",
    round_trip: "Round trip",
    outbound: "Outbound flight",
    inbound: "Return flight",
    flight: "Flight",
    from: "From",
    to: "To",
    departure: "Departure",
    arrival: "Arrival",
    passengers: "Passengers",
    name: "Name",
    birth_date: "Date of birth",
    nationality: "Nationality",
    passport: "Passport",
    contact: "Contact",
    payment: "Payment method",
    total: "Total",
    footer: "Please arrive at the airport at least two hours before departure.",
};

const ES: Labels = Labels {
    title: "Recibo de billete electrónico",
    reference: "Código de reserva",
    issued: "Emitido",
    trip: "Viaje",
    one_way: "Solo ida",
    round_trip: "Ida y vuelta",
    outbound: "Vuelo de ida",
    inbound: "Vuelo de regreso",
    flight: "Vuelo",
    from: "Origen",
    to: "Destino",
    departure: "Salida",
    arrival: "Llegada",
    passengers: "Pasajeros",
    name: "Nombre",
    birth_date: "Fecha de nacimiento",
    nationality: "Nacionalidad",
    passport: "Pasaporte",
    contact: "Contacto",
    payment: "Forma de pago",
    total: "Total",
    footer: "Preséntese en el aeropuerto al menos dos horas antes de la salida.",
};

fn labels(language: Language) -> &'static Labels {
    match language {
        Language::En => &EN,
        Language::Es => &ES,
    }
}

fn label(layout: Layout, pick: fn(&Labels) -> &'static str) -> String {
    match layout {
        Layout::Single(language) => escape_html(pick(labels(language))),
        Layout::Bilingual => {
            let (en, es) = (pick(&EN), pick(&ES));
            if en == es {
                escape_html(en)
            } else {
                format!("{} / <span class=\"alt\">{}</span>", escape_html(en), escape_html(es))
            }
        }
    }
}

fn payment_label(method: &str, language: Language) -> &'static str {
    match (method, language) {
        ("cash", Language::En) => "Cash",
        ("cash", Language::Es) => "Efectivo",
        ("card", Language::En) => "Card",
        ("card", Language::Es) => "Tarjeta",
        (_, Language::En) => "Bank transfer",
        (_, Language::Es) => "Transferencia bancaria",
    }
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_email_subject(ticket: &Ticket, language: Language) -> String {
    match language {
        Language::En => format!(
            "Your booking {} is confirmed: {} to {}",
            ticket.reference, ticket.origin, ticket.destination
        ),
        Language::Es => format!(
            "Su reserva {} está confirmada: {} a {}",
            ticket.reference, ticket.origin, ticket.destination
        ),
    }
}

fn flight_card(heading: String, leg: &FlightLeg, layout: Layout) -> String {
    format!(
        r#"<section class="flight">
  <h2>{heading}</h2>
  <table>
    <tr><th>{flight}</th><td>{number}</td></tr>
    <tr><th>{from}</th><td>{origin}</td></tr>
    <tr><th>{to}</th><td>{destination}</td></tr>
    <tr><th>{departure}</th><td>{dep_time}</td></tr>
    <tr><th>{arrival}</th><td>{arr_time}</td></tr>
  </table>
</section>
"#,
        heading = heading,
        flight = label(layout, |l| l.flight),
        number = escape_html(&leg.flight_number),
        from = label(layout, |l| l.from),
        origin = escape_html(&leg.origin),
        to = label(layout, |l| l.to),
        destination = escape_html(&leg.destination),
        departure = label(layout, |l| l.departure),
        dep_time = leg.departure_time.format("%Y-%m-%d %H:%M"),
        arrival = label(layout, |l| l.arrival),
        arr_time = leg.arrival_time.format("%Y-%m-%d %H:%M"),
    )
}

fn passenger_row(passenger: &Passenger) -> String {
    format!(
        "    <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
        escape_html(&passenger.full_name()),
        passenger.birth_date.format("%Y-%m-%d"),
        escape_html(&passenger.nationality),
        escape_html(passenger.passport_number.as_deref().unwrap_or("-")),
    )
}

/// HTML e-ticket used for the confirmation email, saved receipts and the
/// receipt endpoint.
pub fn render_ticket_html(ticket: &Ticket, layout: Layout) -> String {
    let trip = match ticket.trip_type {
        TripType::OneWay => label(layout, |l| l.one_way),
        TripType::RoundTrip => label(layout, |l| l.round_trip),
    };
    let payment = match layout {
        Layout::Single(language) => payment_label(ticket.payment_method.as_str(), language).to_string(),
        Layout::Bilingual => format!(
            "{} / {}",
            payment_label(ticket.payment_method.as_str(), Language::En),
            payment_label(ticket.payment_method.as_str(), Language::Es)
        ),
    };
    let lang = match layout {
        Layout::Single(Language::Es) => "es",
        _ => "en",
    };

    let mut html = String::new();
    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="utf-8">
<title>{reference}</title>
<style>
  body {{ font-family: Helvetica, Arial, sans-serif; color: #1f2933; margin: 24px; }}
  h1 {{ font-size: 20px; margin-bottom: 4px; }}
  h2 {{ font-size: 16px; border-bottom: 1px solid #d9e2ec; padding-bottom: 4px; }}
  table {{ border-collapse: collapse; width: 100%; }}
  th, td {{ text-align: left; padding: 4px 8px; }}
  .alt {{ color: #627d98; }}
  .total {{ font-size: 18px; font-weight: bold; }}
</style>
</head>
<body>
<header>
  <h1>{title}</h1>
  <p>{reference_label}: <strong>{reference}</strong></p>
  <p>{issued_label}: {issued} &middot; {trip_label}: {trip}</p>
</header>
"#,
        lang = lang,
        title = label(layout, |l| l.title),
        reference_label = label(layout, |l| l.reference),
        reference = escape_html(&ticket.reference),
        issued_label = label(layout, |l| l.issued),
        issued = ticket.created_at.format("%Y-%m-%d %H:%M UTC"),
        trip_label = label(layout, |l| l.trip),
        trip = trip,
    ));

    html.push_str(&flight_card(label(layout, |l| l.outbound), &ticket.outbound, layout));
    if let Some(leg) = &ticket.return_leg {
        html.push_str(&flight_card(label(layout, |l| l.inbound), leg, layout));
    }

    html.push_str(&format!(
        r#"<section class="passengers">
  <h2>{passengers}</h2>
  <table>
    <tr><th>{name}</th><th>{birth}</th><th>{nationality}</th><th>{passport}</th></tr>
"#,
        passengers = label(layout, |l| l.passengers),
        name = label(layout, |l| l.name),
        birth = label(layout, |l| l.birth_date),
        nationality = label(layout, |l| l.nationality),
        passport = label(layout, |l| l.passport),
    ));
    for passenger in &ticket.passengers {
        html.push_str(&passenger_row(passenger));
    }
    html.push_str("  </table>\n</section>\n");

    html.push_str(&format!(
        r#"<section class="summary">
  <p>{contact_label}: {contact_name}, {email}, {phone}</p>
  <p>{payment_label}: {payment}</p>
  <p class="total">{total_label}: {total}</p>
</section>
<footer><p>{footer}</p></footer>
</body>
</html>
"#,
        contact_label = label(layout, |l| l.contact),
        contact_name = escape_html(&ticket.contact.name),
        email = escape_html(ticket.contact.email.expose()),
        phone = escape_html(ticket.contact.phone.expose()),
        payment_label = label(layout, |l| l.payment),
        payment = escape_html(&payment),
        total_label = label(layout, |l| l.total),
        total = format_amount(ticket.total_price, &ticket.currency),
        footer = label(layout, |l| l.footer),
    ));

    html
}
