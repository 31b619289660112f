use charter_core::booking::{format_amount, FlightLeg, Ticket};
use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str};

const PAGE_W: f32 = 595.0;
const PAGE_H: f32 = 842.0;
const MARGIN: f32 = 50.0;
const LINE_H: f32 = 16.0;

/// Single-page A4 receipt. Text is limited to what the built-in Helvetica
/// font can show; anything outside ASCII is replaced with `?`.
struct ReceiptPdf {
    pdf: Pdf,
    catalog_id: Ref,
    pages_id: Ref,
    page_id: Ref,
    content_id: Ref,
    content: Content,
    cursor: f32,
}

impl ReceiptPdf {
    fn new() -> Self {
        let mut pdf = Pdf::new();
        let catalog_id = Ref::new(1);
        let pages_id = Ref::new(2);
        let font_id = Ref::new(3);
        let page_id = Ref::new(4);
        let content_id = Ref::new(5);

        pdf.type1_font(font_id).base_font(Name(b"Helvetica"));

        {
            let mut page = pdf.page(page_id);
            page.parent(pages_id)
                .media_box(Rect::new(0.0, 0.0, PAGE_W, PAGE_H))
                .contents(content_id);
            page.resources().fonts().pair(Name(b"F1"), font_id);
        }

        Self {
            pdf,
            catalog_id,
            pages_id,
            page_id,
            content_id,
            content: Content::new(),
            cursor: PAGE_H - MARGIN,
        }
    }

    fn text_at(&mut self, x: f32, size: f32, text: &str) {
        let bytes = pdf_safe(text);
        self.content.begin_text();
        self.content.set_font(Name(b"F1"), size);
        self.content.set_text_matrix([1.0, 0.0, 0.0, 1.0, x, self.cursor]);
        self.content.show(Str(&bytes));
        self.content.end_text();
    }

    fn line(&mut self, size: f32, text: &str) {
        self.text_at(MARGIN, size, text);
        self.cursor -= LINE_H;
    }

    fn field(&mut self, label: &str, value: &str) {
        self.text_at(MARGIN, 10.0, label);
        self.text_at(MARGIN + 130.0, 10.0, value);
        self.cursor -= LINE_H;
    }

    fn rule(&mut self) {
        self.cursor += LINE_H / 2.0;
        self.content.save_state();
        self.content.set_stroke_rgb(0.65, 0.65, 0.65);
        self.content.move_to(MARGIN, self.cursor);
        self.content.line_to(PAGE_W - MARGIN, self.cursor);
        self.content.stroke();
        self.content.restore_state();
        self.cursor -= LINE_H;
    }

    fn leg(&mut self, heading: &str, leg: &FlightLeg) {
        self.line(12.0, heading);
        self.field("Flight", &leg.flight_number);
        self.field("Route", &format!("{} - {}", leg.origin, leg.destination));
        self.field("Departure", &leg.departure_time.format("%Y-%m-%d %H:%M").to_string());
        self.field("Arrival", &leg.arrival_time.format("%Y-%m-%d %H:%M").to_string());
        self.rule();
    }

    fn finish(mut self) -> Vec<u8> {
        let content = std::mem::replace(&mut self.content, Content::new());
        self.pdf.stream(self.content_id, &content.finish());
        self.pdf.catalog(self.catalog_id).pages(self.pages_id);
        self.pdf.pages(self.pages_id).kids([self.page_id]).count(1);
        self.pdf.finish()
    }
}

fn pdf_safe(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c as u8 } else { b'?' })
        .collect()
}

pub fn render_receipt_pdf(ticket: &Ticket) -> Vec<u8> {
    let mut doc = ReceiptPdf::new();

    doc.line(16.0, "E-Ticket Receipt");
    doc.cursor -= 4.0;
    doc.field("Booking reference", &ticket.reference);
    doc.field("Issued", &ticket.created_at.format("%Y-%m-%d %H:%M UTC").to_string());
    doc.field("Trip", ticket.trip_type.as_str());
    doc.rule();

    doc.leg("Outbound flight", &ticket.outbound);
    if let Some(back) = &ticket.return_leg {
        doc.leg("Return flight", back);
    }

    doc.line(12.0, "Passengers");
    for (i, p) in ticket.passengers.iter().enumerate() {
        let passport = p.passport_number.as_deref().unwrap_or("-");
        doc.field(
            &format!("{}.", i + 1),
            &format!("{}  ({}, {}, {})", p.full_name(), p.birth_date, p.nationality, passport),
        );
    }
    doc.rule();

    doc.field("Contact", &ticket.contact.name);
    doc.field("Payment method", ticket.payment_method.as_str());
    doc.line(14.0, &format!("Total: {}", format_amount(ticket.total_price, &ticket.currency)));

    doc.finish()
}
