//! Company pricing policy and prompt templates.
//!
//! The policy document below is the single source of truth the model is
//! given for pricing. Every estimate must be derived from it plus the
//! photo; the prompt forbids generic defaults.

/// Master pricing policy handed to the model verbatim with every
/// analysis request.
pub const PRICING_POLICY: &str = r#"# REFINEAI - MASTER PRICING POLICY
Version: 3.0
Currency: USD

## COMPANY PROFILE

### RefineAI - Bathroom Refinishing Solutions
- Experience: 15+ years in the market
- Specialty: high-quality bathroom refinishing
- Coverage: national, with regional variation
- Standard warranty: 5 years
- Certifications: EPA, OSHA compliant

## DYNAMIC PRICING STRUCTURE

### 1. BASE PRICES PER SERVICE CATEGORY

#### Bathtub Refinishing
- Small (up to 40 sq ft): $380-520
- Medium (40-60 sq ft): $480-680
- Large (60+ sq ft): $580-820
- Vintage/clawfoot: +$150-300 premium
- Jacuzzi/jet tub: +$200-400 premium

#### Shower Refinishing
- Simple walk-in: $420-580
- Shower/tub combo: $520-720
- Glass enclosure: $580-850
- Full tile surround: +$200-450
- Multi-head system: +$100-250

#### Full Bathroom
- Half bath (2 fixtures): $650-950
- Full bath (3-4 fixtures): $1,200-1,800
- Master suite: $1,600-2,400
- Commercial grade: +50% premium

#### Tile Refinishing
- Per sq ft: $8-15 base
- Project minimum: $280
- Floor tiles: +$2-4 per sq ft
- Decorative/mosaic: +$3-6 per sq ft

#### Sink & Vanity Refinishing
- Pedestal sink: $180-280
- Vanity top: $220-380
- Double vanity: $350-550
- Vessel sinks: +$50-100

### 2. COMPLEXITY FACTORS (multipliers)

#### Level 1-2: Simple (1.0x - 1.1x)
Clean surfaces, light wear, standard colors, no structural repairs,
easy working access.

#### Level 3-4: Moderate (1.2x - 1.4x)
Moderate wear, some staining, small chips or scratches, extra prep,
simple color change.

#### Level 5-6: Intermediate (1.5x - 1.7x)
Multiple visible defects, some repairs needed, extensive prep,
custom colors.

#### Level 7-8: Complex (1.8x - 2.2x)
Significant structural damage, several large repairs, difficult
working conditions, specialty finishes.

#### Level 9-10: Extreme (2.3x - 3.0x)
Partial rebuild required, hazardous conditions (asbestos and similar),
very difficult access, emergency work.

### 3. SURFACE PREPARATION AND MATERIALS

#### Surface preparation
- Basic cleaning: $45-75
- Scraping: $75-150
- Chemical stripping: $125-250
- Sanding/grinding: $100-200
- Specialty primer: $50-120

#### Refinishing materials
- Standard polyurethane: base cost
- Premium epoxy: +$80-150
- Commercial grade: +$150-300
- Antimicrobial coating: +$60-120
- Textured finish: +$70-140

#### Structural repairs
- Chip repair (small): $25-60 each
- Crack repair: $40-100 per linear ft
- Hole repair: $75-200 per hole
- Caulk replacement: $35-75
- Hardware replacement: $45-150

### 4. SURFACE MATERIAL AND AGE FACTORS

#### Base material
- Fiberglass: base pricing
- Acrylic: -5% to -10%
- Cast iron: +10% to +20%
- Steel/porcelain: +5% to +15%
- Natural stone: +20% to +40%
- Concrete: +15% to +30%

#### Surface age
- New (0-3 years): base pricing
- Recent (3-8 years): +0% to +5%
- Mature (8-15 years): +5% to +15%
- Old (15-25 years): +15% to +30%
- Vintage (25+ years): +25% to +50%

### 5. LABOR ESTIMATES

#### Estimated hours per project
- Small bathtub: 6-10 hours
- Large shower: 8-14 hours
- Full bathroom: 16-28 hours
- Complex restoration: 20-40 hours

#### Base hourly rates
- Standard technician: $65-85/hour
- Senior technician: $85-105/hour
- Specialist work: $105-130/hour

## DYNAMIC CALCULATION INSTRUCTIONS

For every project:
1. ASSESS THE IMAGE: identify the surface type, estimate the area in
   sq ft, rate overall condition on the 1-10 scale, list specific
   visible damage.
2. APPLY PRICING: start from the category base price, apply the
   complexity multiplier, add repair costs, include material and age
   factors.
3. COMPUTE THE TOTAL: base x multiplier + repairs + extras, rounded to
   a multiple of $25.

### WORKED EXAMPLE
"8-year-old fiberglass bathtub, 45 sq ft, a few chips and moderate
wear, needs standard refinishing:"
- Base: $480 (medium bathtub)
- Complexity: level 4 = 1.3x
- Chips: 3 small = $75
- Age: 8 years = +5%
- Calculation: ($480 x 1.3 + $75) x 1.05 = $734
- Final: $725 (rounded)
"#;

/// Builds the full analysis prompt for one photo submission.
pub fn build_analysis_prompt(service_type_name: &str) -> String {
    format!(
        r#"IMPORTANT: Read this company pricing policy COMPLETELY before analyzing the image:

{PRICING_POLICY}

---

TASK: Analyze this bathroom photo for refinishing and price the job DYNAMICALLY using ONLY the policy above.

NEVER use fixed prices. Every price must be derived from:
1. Visual analysis of the image (condition, size, complexity)
2. The company pricing policy (above)
3. Service category: {service_type_name}

Respond with exactly this JSON:

{{
  "complexity": (1-10 scale based on visual analysis),
  "surfaceArea": (estimated area in sq ft from the image),
  "conditionAssessment": {{
    "damage": ["specific damage visible in the photo"],
    "cleanability": "poor|fair|good|excellent",
    "existingFinish": "detailed description of the current finish"
  }},
  "breakdown": {{
    "basePrice": (base price derived from the policy),
    "complexityMultiplier": (1.0-3.0 multiplier from visual complexity),
    "additionalFees": (extra costs: repairs, preparation, etc),
    "laborHours": (estimated hours from the visible condition)
  }},
  "recommendations": ["specific recommendations from the visual analysis"],
  "totalPrice": (final dynamically calculated price)
}}

CRITICAL:
- Examine the image CAREFULLY to determine size, condition and complexity
- Use the pricing policy to derive every cost
- NEVER use default values or generic estimates
- Justify the price from the actual visible surface condition"#
    )
}

/// Prompt for a chat turn. `system_prompt` is the admin-configured
/// assistant persona.
pub fn build_chat_prompt(system_prompt: &str, user_message: &str) -> String {
    format!("{system_prompt}\n\nCustomer message:\n{user_message}\n\nReply helpfully and concisely.")
}
