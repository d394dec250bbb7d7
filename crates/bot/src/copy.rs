//! User-facing chat copy. Flow handlers stay string-free: every message the
//! bot sends is built here.

use tiendy_core::domain::cart::{CartLine, CartTotals};
use tiendy_core::{AmbiguousOption, DeliveryMethod, OrderDraft, Product, MIN_DELIVERY_TOTAL};

/// Fixed pickup point announced for "retiro en tienda" orders.
pub const STORE_PICKUP_ADDRESS: &str = "Av. Providencia 1234, Santiago";

pub fn format_clp(amount: i64) -> String {
    let negative = amount < 0;
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (index, c) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if negative {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

pub fn welcome_new_user() -> String {
    "¡Hola! 👋 Bienvenido/a a Tiendy, tu almacén natural.\n\
     Para comenzar necesito registrarte. ¿Cuál es tu nombre y apellido?"
        .to_string()
}

pub fn ask_full_name_again() -> String {
    "Necesito tu nombre y apellido para registrarte (por ejemplo: Ana Pérez). ¿Me los envías?"
        .to_string()
}

pub fn registered_greeting(name: &str) -> String {
    format!("¡Hola {name}! 👋 Qué bueno verte de nuevo.\n\n{}", main_menu())
}

pub fn registration_complete(name: &str) -> String {
    format!("¡Listo {name}! Quedaste registrado/a. 🎉\n\n{}", main_menu())
}

pub fn main_menu() -> String {
    "¿Qué te gustaría hacer?\n\
     1️⃣ Buscar productos\n\
     2️⃣ Hacer un pedido\n\
     3️⃣ Ver mi carrito\n\
     4️⃣ Mis pedidos\n\
     5️⃣ Preguntas frecuentes\n\n\
     Responde con el número de la opción."
        .to_string()
}

pub fn invalid_menu_choice() -> String {
    format!("No reconocí esa opción. 🙏\n\n{}", main_menu())
}

pub fn product_info_menu() -> String {
    "¿Qué quieres hacer ahora?\n\
     1️⃣ Buscar otro producto\n\
     2️⃣ Hacer un pedido\n\
     3️⃣ Volver al menú"
        .to_string()
}

pub fn orders_menu() -> String {
    "📦 Pedidos\n\
     1️⃣ Hacer un pedido nuevo\n\
     2️⃣ Volver al menú"
        .to_string()
}

pub fn faq_menu() -> String {
    "Puedo ayudarte con estas preguntas frecuentes:\n\
     • Horario de atención\n\
     • Despachos y entregas\n\
     • Formas de pago\n\
     • Cambios y devoluciones\n\n\
     Escribe tu pregunta, o \"menú\" para volver."
        .to_string()
}

pub fn faq_answer(topic: tiendy_core::classify::FaqTopic) -> String {
    use tiendy_core::classify::FaqTopic;
    match topic {
        FaqTopic::Hours => {
            "🕐 Atendemos de lunes a viernes de 9:00 a 19:00 y sábados de 10:00 a 14:00."
                .to_string()
        }
        FaqTopic::Shipping => format!(
            "🚚 Despachamos a todo Chile con compras sobre {}. También puedes retirar gratis en {}.",
            format_clp(MIN_DELIVERY_TOTAL),
            STORE_PICKUP_ADDRESS
        ),
        FaqTopic::Payment => {
            "💳 Aceptamos transferencia bancaria. Te enviamos los datos al confirmar tu pedido."
                .to_string()
        }
        FaqTopic::Returns => {
            "🔄 Aceptamos cambios dentro de 10 días con el producto sellado. Escríbenos y lo coordinamos."
                .to_string()
        }
    }
}

pub fn farewell_reply() -> String {
    "¡Gracias por escribirnos! 👋 Que tengas un buen día. Vuelve cuando quieras.".to_string()
}

pub fn expiry_notice(cart_had_items: bool) -> String {
    if cart_had_items {
        "⏰ Tu sesión expiró por inactividad y vaciamos tu carrito. \
         Escríbenos de nuevo cuando quieras retomar tu compra."
            .to_string()
    } else {
        "⏰ Tu sesión expiró por inactividad. Escríbenos de nuevo cuando quieras.".to_string()
    }
}

pub fn inactivity_warning() -> String {
    "⏳ Sigues ahí? Tu sesión expirará en 3 minutos por inactividad. \
     Responde cualquier cosa para mantenerla activa."
        .to_string()
}

pub fn context_reset_notice() -> String {
    format!("🔄 Volvimos al menú principal por inactividad.\n\n{}", main_menu())
}

pub fn empathetic_redirect() -> String {
    format!(
        "Lamento que hayas tenido una mala experiencia. 🙏 Estoy aquí para ayudarte.\n\n{}",
        main_menu()
    )
}

pub fn temporarily_unavailable() -> String {
    "Estamos con problemas técnicos en este momento. 🙏 Inténtalo de nuevo en unos minutos."
        .to_string()
}

pub fn session_error_reset() -> String {
    format!(
        "Lo sentimos, perdimos los datos de tu sesión y tuvimos que reiniciarla. 🙏\n\n{}",
        main_menu()
    )
}

pub fn ask_search_query() -> String {
    "🔍 ¿Qué producto buscas? Escríbeme el nombre (por ejemplo: miel de ulmo).".to_string()
}

pub fn clarify_search_query() -> String {
    "No logré identificar un producto en tu mensaje. 🙏 ¿Me dices el nombre de lo que buscas?"
        .to_string()
}

pub fn no_results(term: &str) -> String {
    format!("No encontré resultados para \"{term}\". 😔 ¿Quieres buscar otra cosa?")
}

pub fn search_results_list(term: &str, products: &[Product]) -> String {
    let mut message = format!("Encontré {} productos para \"{term}\":\n", products.len());
    for (index, product) in products.iter().enumerate() {
        message.push_str(&format!(
            "{}. {} — {}\n",
            index + 1,
            product.name,
            format_clp(product.unit_price)
        ));
    }
    message.push_str("\nResponde con el número del producto que te interesa.");
    message
}

pub fn invalid_selection(count: usize) -> String {
    format!("Elige un número entre 1 y {count}, por favor.")
}

pub fn product_details(product: &Product) -> String {
    let mut message = format!(
        "✨ {}\nPrecio: {}\nStock disponible: {}\n",
        product.name,
        format_clp(product.unit_price),
        product.stock
    );
    if product.bulk_price > 0 && product.bulk_price < product.unit_price {
        message.push_str(&format!(
            "Precio por mayor (desde {} unidades): {}\n",
            tiendy_core::BULK_THRESHOLD,
            format_clp(product.bulk_price)
        ));
    }
    message.push_str(
        "\n1️⃣ Sí, agregar al carrito\n2️⃣ Buscar otro producto\nO escribe otra consulta.",
    );
    message
}

pub fn details_reprompt() -> String {
    "¿Agrego el producto al carrito?\n1️⃣ Sí\n2️⃣ Buscar otro producto".to_string()
}

pub fn added_to_cart(line: &CartLine, totals: &CartTotals) -> String {
    format!(
        "✅ Agregado: {} x{} ({}).\nTu carrito suma {}.\n\n{}",
        line.name,
        line.quantity,
        format_clp(line.line_total),
        format_clp(totals.total),
        product_info_menu()
    )
}

pub fn stock_insufficient(name: &str, in_cart: u32, available: u32) -> String {
    format!(
        "No tenemos stock suficiente de {name}: tienes {in_cart} en el carrito y quedan \
         {available} disponibles."
    )
}

pub fn cart_summary(lines: &[CartLine], totals: &CartTotals) -> String {
    if lines.is_empty() {
        return "🛒 Tu carrito está vacío.".to_string();
    }

    let mut message = "🛒 Tu carrito:\n".to_string();
    for line in lines {
        let tag = if line.bulk_price_applied { " (precio por mayor)" } else { "" };
        message.push_str(&format!(
            "• {} x{} — {}{tag}\n",
            line.name,
            line.quantity,
            format_clp(line.line_total)
        ));
    }
    if totals.discount > 0 {
        message.push_str(&format!(
            "\nSubtotal: {}\nDescuento por mayor: -{}\n",
            format_clp(totals.subtotal_at_unit_price),
            format_clp(totals.discount)
        ));
    }
    message.push_str(&format!("Total: {}", format_clp(totals.total)));
    message
}

pub fn ask_product_list() -> String {
    "📝 Escríbeme tu pedido con productos y cantidades.\n\
     Por ejemplo: \"2 miel de ulmo, 1 té verde\".\n\
     Escribe \"cancelar\" para volver al menú."
        .to_string()
}

pub fn product_list_not_understood() -> String {
    "No logré identificar productos en tu mensaje. 🙏 Inténtalo de nuevo, por ejemplo: \
     \"2 miel de ulmo, 1 té verde\"."
        .to_string()
}

pub struct ExtractionSummary<'a> {
    pub added: &'a [CartLine],
    pub ambiguous: &'a [AmbiguousOption],
    pub not_found: &'a [(String, String)],
}

pub fn extraction_summary(summary: &ExtractionSummary<'_>) -> String {
    let mut message = String::new();

    if !summary.added.is_empty() {
        message.push_str("✅ Agregado al carrito:\n");
        for line in summary.added {
            message.push_str(&format!(
                "• {} x{} — {}\n",
                line.name,
                line.quantity,
                format_clp(line.line_total)
            ));
        }
    }

    if !summary.not_found.is_empty() {
        message.push_str("\n❌ No pude agregar:\n");
        for (name, reason) in summary.not_found {
            message.push_str(&format!("• {name}: {reason}\n"));
        }
    }

    if !summary.ambiguous.is_empty() {
        message.push_str("\n🤔 Encontré varias opciones para algunos productos:\n");
        let mut last_requested = None;
        for option in summary.ambiguous {
            if last_requested != Some(&option.requested_name) {
                message.push_str(&format!("Para \"{}\":\n", option.requested_name));
                last_requested = Some(&option.requested_name);
            }
            message.push_str(&format!(
                "  {}. {} — {}\n",
                option.number,
                option.product.name,
                format_clp(option.product.unit_price)
            ));
        }
        message.push_str(
            "\nResponde con los números que quieres, separados por coma.\n\
             Puedes indicar cantidad con \"número: cantidad\" (ej: \"1: 2, 3\").",
        );
    }

    message.trim_end().to_string()
}

pub fn ambiguous_reprompt() -> String {
    "No entendí tu selección. Responde con los números de las opciones, por ejemplo \
     \"1, 3\" o \"1: 2\"."
        .to_string()
}

pub fn ask_add_more(lines: &[CartLine], totals: &CartTotals) -> String {
    format!(
        "{}\n\n¿Quieres algo más?\n1️⃣ Agregar más productos\n2️⃣ Finalizar pedido",
        cart_summary(lines, totals)
    )
}

pub fn add_more_reprompt() -> String {
    "Responde 1 para agregar más productos o 2 para finalizar el pedido.".to_string()
}

pub fn empty_cart_abort() -> String {
    format!("Tu carrito está vacío, no hay nada que finalizar. 🙏\n\n{}", main_menu())
}

pub fn ask_delivery_method() -> String {
    format!(
        "🚚 ¿Cómo prefieres recibir tu pedido?\n\
         1️⃣ Retiro en tienda ({STORE_PICKUP_ADDRESS})\n\
         2️⃣ Despacho a domicilio (compra mínima {})",
        format_clp(MIN_DELIVERY_TOTAL)
    )
}

pub fn delivery_minimum_not_met(total: i64, missing: i64) -> String {
    format!(
        "Para despacho a domicilio la compra mínima es {}. Tu carrito suma {} — te faltan {}. \
         ¿Agregamos algo más?",
        format_clp(MIN_DELIVERY_TOTAL),
        format_clp(total),
        format_clp(missing)
    )
}

pub fn ask_address() -> String {
    "📍 ¿A qué dirección despachamos? (calle y número)".to_string()
}

pub fn address_too_short() -> String {
    "Esa dirección parece muy corta. Envíame calle y número, por favor.".to_string()
}

pub fn ask_city() -> String {
    "¿En qué ciudad?".to_string()
}

pub fn city_too_short() -> String {
    "No reconocí la ciudad. ¿Me la escribes de nuevo?".to_string()
}

pub fn ask_district() -> String {
    "¿En qué comuna?".to_string()
}

pub fn district_too_short() -> String {
    "No reconocí la comuna. ¿Me la escribes de nuevo?".to_string()
}

pub fn ask_courier() -> String {
    "📦 ¿Con qué courier enviamos tu pedido?\n\
     1️⃣ Starken\n\
     2️⃣ Chilexpress\n\
     3️⃣ Correos de Chile"
        .to_string()
}

pub fn invalid_courier() -> String {
    format!("No reconocí ese courier. {}", ask_courier())
}

pub fn order_confirmation_summary(
    lines: &[CartLine],
    totals: &CartTotals,
    draft: &OrderDraft,
) -> String {
    let mut message = format!("📋 Resumen de tu pedido:\n\n{}\n\n", cart_summary(lines, totals));

    match draft.delivery_method {
        Some(DeliveryMethod::Pickup) => {
            message.push_str(&format!("Entrega: retiro en tienda ({STORE_PICKUP_ADDRESS})\n"));
        }
        Some(DeliveryMethod::Delivery) => {
            message.push_str(&format!(
                "Entrega: despacho a {}, {}, {}\n",
                draft.address.as_deref().unwrap_or("-"),
                draft.district.as_deref().unwrap_or("-"),
                draft.city.as_deref().unwrap_or("-")
            ));
            if let Some(courier) = draft.courier {
                message.push_str(&format!("Courier: {}\n", courier.label()));
            }
        }
        None => {}
    }

    message.push_str("\nEscribe \"confirmar\" para enviar tu pedido o \"cancelar\" para descartarlo.");
    message
}

pub fn confirm_reprompt() -> String {
    "Escribe \"confirmar\" para enviar tu pedido o \"cancelar\" para descartarlo.".to_string()
}

pub fn order_submitted(order_id: &str, total: i64) -> String {
    format!(
        "🎉 ¡Pedido recibido! Tu número de orden es {order_id}.\n\
         Total a pagar: {}.\n\n{}",
        format_clp(total),
        payment_instructions()
    )
}

pub fn payment_instructions() -> String {
    "💳 Paga por transferencia bancaria:\n\
     Banco Estado — Cuenta corriente 123-456-789\n\
     Tiendy SpA — RUT 76.543.210-K\n\
     pagos@tiendy.cl\n\n\
     Envíanos el comprobante por este chat y despachamos tu pedido."
        .to_string()
}

pub fn order_failed(detail: &str) -> String {
    format!(
        "😔 No pudimos registrar tu pedido: {detail}\n\
         Tu carrito sigue intacto. Escribe \"confirmar\" para reintentar o \"cancelar\" para \
         descartarlo."
    )
}

pub fn order_cancelled() -> String {
    format!("Pedido cancelado. Tu carrito quedó vacío. 🙏\n\n{}", main_menu())
}

#[cfg(test)]
mod tests {
    use super::format_clp;

    #[test]
    fn clp_amounts_use_dot_thousand_separators() {
        assert_eq!(format_clp(0), "$0");
        assert_eq!(format_clp(999), "$999");
        assert_eq!(format_clp(50_000), "$50.000");
        assert_eq!(format_clp(1_234_567), "$1.234.567");
        assert_eq!(format_clp(-20_000), "-$20.000");
    }
}
