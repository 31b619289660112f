use charter_core::booking::{format_amount, FlightLeg, Ticket};

/// Characters per line on an 80mm thermal roll with font A.
pub const LINE_WIDTH: usize = 42;

const INIT: &[u8] = &[0x1B, b'@'];
const ALIGN_LEFT: &[u8] = &[0x1B, b'a', 0];
const ALIGN_CENTER: &[u8] = &[0x1B, b'a', 1];
const BOLD_ON: &[u8] = &[0x1B, b'E', 1];
const BOLD_OFF: &[u8] = &[0x1B, b'E', 0];
const FEED_AND_CUT: &[u8] = &[0x1D, b'V', 66, 3];

struct Receipt {
    buf: Vec<u8>,
}

impl Receipt {
    fn new() -> Self {
        Self { buf: INIT.to_vec() }
    }

    fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    fn push(&mut self, text: &str) {
        self.buf.extend(
            text.chars()
                .map(|c| if c.is_ascii() && !c.is_ascii_control() { c as u8 } else { b'?' }),
        );
    }

    fn text(&mut self, text: &str) -> &mut Self {
        self.push(text);
        self.buf.push(b'\n');
        self
    }

    /// Bold is switched off before the line feed so the next line starts clean.
    fn bold(&mut self, text: &str) -> &mut Self {
        self.raw(BOLD_ON).push(text);
        self.raw(BOLD_OFF).buf.push(b'\n');
        self
    }

    fn pair(&mut self, label: &str, value: &str) -> &mut Self {
        self.text(&pair_line(label, value))
    }

    fn separator(&mut self) -> &mut Self {
        self.text(&"-".repeat(LINE_WIDTH))
    }

    fn leg(&mut self, heading: &str, leg: &FlightLeg) -> &mut Self {
        self.bold(heading)
            .pair("Flight", &leg.flight_number)
            .pair("Route", &format!("{} - {}", leg.origin, leg.destination))
            .pair("Departs", &leg.departure_time.format("%Y-%m-%d %H:%M").to_string())
            .pair("Arrives", &leg.arrival_time.format("%Y-%m-%d %H:%M").to_string())
            .separator()
    }
}

/// Label on the left, value flush right.
fn pair_line(label: &str, value: &str) -> String {
    let used = label.chars().count() + value.chars().count();
    let pad = LINE_WIDTH.saturating_sub(used).max(1);
    format!("{}{}{}", label, " ".repeat(pad), value)
}

/// ESC/POS byte stream for the counter receipt printer.
pub fn render_receipt(ticket: &Ticket) -> Vec<u8> {
    let mut r = Receipt::new();
    r.raw(ALIGN_CENTER)
        .bold("E-TICKET RECEIPT")
        .text(&ticket.reference)
        .raw(ALIGN_LEFT)
        .separator();

    r.leg("OUTBOUND", &ticket.outbound);
    if let Some(back) = &ticket.return_leg {
        r.leg("RETURN", back);
    }

    for p in &ticket.passengers {
        r.text(&p.full_name());
    }
    r.separator()
        .pair("Payment", ticket.payment_method.as_str())
        .bold(&pair_line("TOTAL", &format_amount(ticket.total_price, &ticket.currency)))
        .text("")
        .raw(FEED_AND_CUT);

    r.buf
}
